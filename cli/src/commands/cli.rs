use std::path::PathBuf;

use clap::Parser;

/// Supervises always-on stream recordings behind a loopback control API.
#[derive(Parser, Debug)]
#[command(name = "surf-vcr", version)]
pub struct Args {
    /// Config file. Defaults to `<user config dir>/surf-vcr.toml`.
    #[arg(long, env = "SURF_VCR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for recorded segments; overrides `video_dir` from the config.
    #[arg(long, env = "SURF_VCR_VIDEO_DIR")]
    pub video_dir: Option<PathBuf>,

    /// Validate the config, create the video directory and exit.
    #[arg(long)]
    pub check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["surf-vcr"]).unwrap();
        assert!(!args.check);
        assert!(args.video_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "surf-vcr",
            "--config",
            "/etc/surf-vcr.toml",
            "--video-dir",
            "/srv/rec",
            "--check",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/surf-vcr.toml")));
        assert_eq!(args.video_dir, Some(PathBuf::from("/srv/rec")));
        assert!(args.check);
    }
}
