use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

/// How chatty a subcommand is by default.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Profile {
    /// `build`: progress milestones and skipped files at info.
    Build,
    /// Inspection commands print their own output; only problems are logged.
    Inspect,
}

fn default_directive(profile: Profile, verbose: u8) -> &'static str {
    match (profile, verbose) {
        (Profile::Build, 0) => "info",
        (Profile::Inspect, 0) => "warn",
        (Profile::Inspect, 1) => "info",
        (_, 1) | (Profile::Inspect, 2) => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins when set.
pub fn init(profile: Profile, verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(profile, verbose)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspection_is_one_step_quieter() {
        assert_eq!(default_directive(Profile::Build, 0), "info");
        assert_eq!(default_directive(Profile::Inspect, 0), "warn");
        assert_eq!(default_directive(Profile::Build, 1), "debug");
        assert_eq!(default_directive(Profile::Inspect, 1), "info");
        assert_eq!(default_directive(Profile::Inspect, 2), "debug");
        assert_eq!(default_directive(Profile::Build, 5), "trace");
    }
}
