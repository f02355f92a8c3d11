//! Global constants used throughout the lockforge codebase.
//!
//! Artifact names, section delimiters and parallelism defaults live here so
//! that the ecosystems, the discovery walk and the report all agree on them.

/// Suffix shared by every lock artifact lockforge writes itself.
pub const LOCK_SUFFIX: &str = "debricked.lock";

/// Name of the lock artifact written by `mvn dependency:tree`.
pub const MAVEN_LOCK_FILE: &str = "maven.debricked.lock";

/// Delimiter between the sections of a concatenated lock artifact.
///
/// The pip artifact is the manifest echo, the package listing and the
/// package metadata joined with this line.
pub const SECTION_DELIMITER: &str = "***";

/// Name of the multi-module marker file written by the Gradle helper task.
pub const GRADLE_MULTIPROJECT_FILE: &str = ".debricked.multiprojects.txt";

/// Name of the lock artifact written by the Gradle dependency task.
pub const GRADLE_LOCK_FILE: &str = "gradle.debricked.lock";

/// Gradle task that enumerates every project of a build.
pub const GRADLE_FIND_PROJECTS_TASK: &str = "debrickedFindSubProjectPaths";

/// Gradle task that dumps the dependency graph of a single project.
pub const GRADLE_DEPENDENCIES_TASK: &str = "debrickedDependencies";

/// Minimum number of scheduler workers regardless of CPU count.
pub const MIN_WORKERS: usize = 1;

/// Default CPU core count when detection fails.
///
/// Used as a fallback when `std::thread::available_parallelism()` returns an error.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Configuration file looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "lockforge.toml";

/// Environment variable that overrides the worker count.
pub const WORKERS_ENV: &str = "LOCKFORGE_WORKERS";

/// Environment variable that disables progress output when set.
pub const NO_PROGRESS_ENV: &str = "LOCKFORGE_NO_PROGRESS";

/// Default worker count: one per available core.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(FALLBACK_CORE_COUNT)
        .max(MIN_WORKERS)
}
