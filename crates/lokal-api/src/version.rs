// Daemon version negotiation.
//
// The daemon advertises its version in a response header. Older daemons
// speak an incompatible protocol, so any response from one is rejected.

use reqwest::header::HeaderMap;
use semver::Version;
use tracing::debug;

use crate::error::Error;

/// Oldest daemon version this client can talk to.
pub const SERVER_MIN_VERSION: &str = "0.6.0";

/// Response header carrying the daemon's version.
pub const SERVER_VERSION_HEADER: &str = "Lokal-Server-Version";

/// Fail if the response advertises a daemon older than [`SERVER_MIN_VERSION`].
///
/// A missing header passes: not every daemon build sends it.
pub fn check_server_version(headers: &HeaderMap) -> Result<(), Error> {
    let Some(raw) = headers.get(SERVER_VERSION_HEADER) else {
        return Ok(());
    };
    let raw = raw.to_str().map_err(|_| Error::InvalidServerVersion {
        value: String::from_utf8_lossy(raw.as_bytes()).into_owned(),
    })?;

    check_version_str(raw)
}

/// Compare a version string against [`SERVER_MIN_VERSION`].
pub fn check_version_str(server: &str) -> Result<(), Error> {
    let server = server.trim();
    let parsed = Version::parse(server).map_err(|_| Error::InvalidServerVersion {
        value: server.to_owned(),
    })?;
    let minimum = Version::parse(SERVER_MIN_VERSION).map_err(|_| Error::InvalidServerVersion {
        value: SERVER_MIN_VERSION.to_owned(),
    })?;

    debug!(server = %parsed, minimum = %minimum, "checking daemon version");

    if parsed < minimum {
        return Err(Error::VersionMismatch {
            server: server.to_owned(),
            minimum: SERVER_MIN_VERSION.to_owned(),
        });
    }
    Ok(())
}
