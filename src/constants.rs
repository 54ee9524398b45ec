//! Application constants for the weather pipeline
//!
//! Raw file encoding, unit conversion factors, and naming conventions for
//! the log and report files written by each run.

// =============================================================================
// Station File Format
// =============================================================================

/// Extension of raw station files (`<station_id>.txt`)
pub const STATION_FILE_EXTENSION: &str = "txt";

/// Field delimiter used by raw station files
pub const STATION_FILE_DELIMITER: u8 = b'\t';

/// Number of columns in every raw row: date, max, min, precipitation
pub const STATION_FILE_COLUMNS: usize = 4;

/// Date format of the first column
pub const RAW_DATE_FORMAT: &str = "%Y%m%d";

/// Raw integer meaning "measurement missing"
pub const MISSING_VALUE_SENTINEL: i64 = -9999;

// =============================================================================
// Unit Conversion
// =============================================================================

/// Raw temperatures are tenths of a degree Celsius
pub const TEMPERATURE_SCALE: f64 = 0.1;

/// Raw precipitation is hundredths of an inch
pub const PRECIPITATION_SCALE: f64 = 0.01;

/// Stored measurements and statistics are rounded to this many decimals
pub const DECIMAL_PLACES: i32 = 4;

// =============================================================================
// Run Output Naming
// =============================================================================

/// Timestamp embedded in log and report file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";

/// Timestamp prefix of every run log line
pub const LOG_LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Prefix of aggregate report files in the results directory
pub const REPORT_FILE_PREFIX: &str = "results_";

/// Extension of aggregate report files
pub const REPORT_FILE_EXTENSION: &str = "json";

/// Banner written around the header of every run log
pub const LOG_BANNER: &str = "===============";

// =============================================================================
// Defaults
// =============================================================================

/// Directory names under the root directory
pub const DEFAULT_DATA_DIR_NAME: &str = "wx_data";
pub const DEFAULT_DATABASE_FILE_NAME: &str = "database.db";
pub const DEFAULT_LOG_DIR_NAME: &str = "logs";
pub const DEFAULT_RESULTS_DIR_NAME: &str = "results";

/// Upper bound on the default worker pool size
pub const MAX_DEFAULT_WORKERS: usize = 4;
