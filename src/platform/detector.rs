//! Once-per-process platform identification.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use super::profile::{lookup, PlatformProfile};
use crate::constants::identity::DMI_PRODUCT_NAME_PATH;
use crate::sysfs::read_first_line;

/// Result of platform identification, computed exactly once per process.
#[derive(Debug, Clone)]
pub struct DetectedPlatform {
    /// Raw platform name read from the identity file, `None` when the file
    /// was unreadable (expected on non-EC2 hosts).
    pub raw_name: Option<String>,
    /// Matching profile, `None` for unknown platforms.
    pub profile: Option<&'static PlatformProfile>,
}

impl DetectedPlatform {
    /// Platform name, when one was detected.
    pub fn name(&self) -> Option<&str> {
        self.raw_name.as_deref()
    }
}

/// Reads the platform identity once and caches the result for the process
/// lifetime. Safe to call from any number of threads; concurrent first
/// callers block until the single detection completes.
#[derive(Debug)]
pub struct PlatformDetector {
    identity_path: PathBuf,
    cached: OnceCell<DetectedPlatform>,
}

impl Default for PlatformDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformDetector {
    /// Detector reading the standard DMI product-name file.
    pub fn new() -> Self {
        Self::with_identity_path(DMI_PRODUCT_NAME_PATH)
    }

    /// Detector reading an alternate identity file. Used by tests and by
    /// hosts running under a sysfs overlay.
    pub fn with_identity_path(path: impl Into<PathBuf>) -> Self {
        Self {
            identity_path: path.into(),
            cached: OnceCell::new(),
        }
    }

    /// Identify the platform, reading the identity file at most once.
    ///
    /// A read failure is cached as "platform unknown" and is not an error.
    pub fn detect(&self) -> &DetectedPlatform {
        self.cached.get_or_init(|| Self::read_identity(&self.identity_path))
    }

    fn read_identity(path: &Path) -> DetectedPlatform {
        let raw_name = match read_first_line(path) {
            Ok(name) => {
                trace!("Platform type is {}", name);
                Some(name)
            }
            Err(e) => {
                // Expected on hosts without a DMI identity, e.g. non-cloud.
                debug!("Could not read platform identity {}: {}", path.display(), e);
                None
            }
        };

        let profile = raw_name.as_deref().and_then(lookup);
        if let (Some(name), None) = (&raw_name, profile) {
            debug!("No platform profile for {}", name);
        }

        DetectedPlatform { raw_name, profile }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::sync::Arc;

    fn identity_file(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("product_name");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "{}", contents).unwrap();
        path
    }

    #[test]
    fn test_known_platform_resolves_profile() {
        let dir = tempfile::tempdir().unwrap();
        let detector = PlatformDetector::with_identity_path(identity_file(&dir, "p4d.24xlarge"));

        let detected = detector.detect();
        assert_eq!(detected.name(), Some("p4d.24xlarge"));
        assert_eq!(detected.profile.unwrap().name, "p4d.24xlarge");
    }

    #[test]
    fn test_unknown_platform_has_no_profile() {
        let dir = tempfile::tempdir().unwrap();
        let detector = PlatformDetector::with_identity_path(identity_file(&dir, "m5.large"));

        let detected = detector.detect();
        assert_eq!(detected.name(), Some("m5.large"));
        assert!(detected.profile.is_none());
    }

    #[test]
    fn test_unreadable_identity_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let detector = PlatformDetector::with_identity_path(dir.path().join("absent"));

        let detected = detector.detect();
        assert!(detected.name().is_none());
        assert!(detected.profile.is_none());
    }

    #[test]
    fn test_identity_read_happens_at_most_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = identity_file(&dir, "p5.48xlarge");
        let detector = PlatformDetector::with_identity_path(&path);

        assert_eq!(detector.detect().name(), Some("p5.48xlarge"));

        // Removing the file must not change the cached result.
        fs::remove_file(&path).unwrap();
        assert_eq!(detector.detect().name(), Some("p5.48xlarge"));
    }

    #[test]
    fn test_concurrent_first_calls_observe_one_result() {
        let dir = tempfile::tempdir().unwrap();
        let detector = Arc::new(PlatformDetector::with_identity_path(identity_file(
            &dir,
            "p4de.24xlarge",
        )));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let detector = Arc::clone(&detector);
                std::thread::spawn(move || {
                    detector.detect() as *const DetectedPlatform as usize
                })
            })
            .collect();

        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(detector.detect().profile.unwrap().name, "p4de.24xlarge");
    }
}
