//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default API base for the viewer
pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Path requested when the viewer is started without an argument
pub const DEFAULT_PATH: &str = "/current.json?q=Warwick,RI";

/// Query parameter carrying the API key
pub const DEFAULT_KEY_PARAM: &str = "key";

/// HTTP client timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Directory under the home dir holding config and store files
pub const CONFIG_DIR_NAME: &str = ".loadstate";

/// Store key for favorite product ids
pub const FAVORITES_KEY: &str = "favorites";

/// Store key for saved weather locations
pub const SAVED_LOCATIONS_KEY: &str = "savedLocations";

/// Store key for URLs favorited from the viewer
pub const FAVORITE_URLS_KEY: &str = "favoriteUrls";

/// Application name
pub const APP_NAME: &str = "loadstate";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
