use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Where log events go, selected with `--log-format` / `ENVSTASH_LOG`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable lines on stderr (`human`)
    Development,
    /// One JSON object per event on stderr (`json`)
    Production,
    /// Nothing printed (`off`); tests install the capture layer instead
    Test,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" | "development" => Ok(Profile::Development),
            "json" | "production" => Ok(Profile::Production),
            "off" | "test" => Ok(Profile::Test),
            other => Err(format!(
                "unknown log format {:?} (expected human, json or off)",
                other
            )),
        }
    }
}

/// `RUST_LOG` when set, otherwise `default`
fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

static INIT: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Only the first call in a process has an effect. If a subscriber is
/// already installed (a test capture, say) it is left in place.
pub fn init(profile: Profile) {
    INIT.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter("envstash=debug"))
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(filter("envstash=info"))
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
        if installed.is_err() {
            tracing::debug!(?profile, "subscriber already installed");
        }
    });
}
