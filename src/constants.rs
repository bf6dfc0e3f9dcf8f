//! Column bounds and fixed values shared by the sync pipeline and the read path.

/// Latest full station dump published by radio-browser.info
pub const DEFAULT_EXPORT_URL: &str =
    "https://exports.radio-browser.info/radiobrowser_stations_latest.json.gz";

// Station column bounds
pub const STATION_NAME_MAX_LEN: usize = 32;
pub const STATION_STREAM_URL_MAX_LEN: usize = 256;
pub const STATION_HOMEPAGE_URL_MAX_LEN: usize = 128;
pub const STATION_ICON_URL_MAX_LEN: usize = 256;

// Reference code lengths
pub const ISO_3166_1_LEN: usize = 2;
pub const ISO_639_1_LEN: usize = 2;
pub const TAG_NAME_MAX_LEN: usize = 16;

/// Every stored URL must carry this scheme prefix
pub const URL_SCHEME_PREFIX: &str = "http";

/// Row cap for search results and page size for list-all
pub const PAGE_SIZE: usize = 100;

/// File written by `debug-tags --save` in the working directory
pub const DEBUG_TAGS_FILE: &str = "debug_tags.txt";

pub const DEFAULT_DATABASE_PATH: &str = "data/catalog.db";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
