use clap::Parser;
use std::path::PathBuf;

/// Options left unset fall back to the config file, then to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "musicroll", about = "Render a piano-roll PNG from the pitches heard in an audio file")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Output PNG [default: input path with a .png extension]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Time between analysed instants, in milliseconds
    #[arg(long)]
    pub spacing_ms: Option<u64>,

    /// Audio window analysed at each instant, in milliseconds
    #[arg(long)]
    pub window_ms: Option<u64>,

    /// Periods of each pitch used by its correlation
    #[arg(long)]
    pub cycles: Option<f64>,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Height of each instant's strip in pixels
    #[arg(long)]
    pub strip_height: Option<u32>,

    /// Magnitudes below this never reach full intensity
    #[arg(long)]
    pub magnitude_floor: Option<f64>,

    /// Save the partial image after this many instants (0 disables)
    #[arg(long)]
    pub checkpoint_every: Option<usize>,

    /// Analyse on the main thread without progress or checkpoints
    #[arg(long)]
    pub sync: bool,

    /// Re-analyse even if the output image already exists
    #[arg(short, long)]
    pub force: bool,

    /// Also export every spectrum as JSON
    #[arg(long)]
    pub timeline_json: Option<PathBuf>,

    /// Config file [default: ./musicroll.toml or the user config dir]
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_invocation() {
        let cli = Cli::try_parse_from(["musicroll", "song.mp3"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("song.mp3"));
        assert!(cli.output.is_none());
        assert!(cli.spacing_ms.is_none());
        assert!(!cli.sync);
        assert!(!cli.force);
    }

    #[test]
    fn overrides_parse() {
        let cli = Cli::try_parse_from([
            "musicroll",
            "song.wav",
            "-o",
            "roll.png",
            "--spacing-ms",
            "250",
            "--cycles",
            "12.5",
            "--sync",
            "--force",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("roll.png")));
        assert_eq!(cli.spacing_ms, Some(250));
        assert_eq!(cli.cycles, Some(12.5));
        assert!(cli.sync);
        assert!(cli.force);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["musicroll"]).is_err());
    }
}
