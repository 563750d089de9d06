use serde::{Deserialize, Serialize};

/// Pengaturan aplikasi yang bisa diubah dari layar Settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub store_name: String,
    pub theme: Theme,
    pub low_stock_threshold: i64,
    pub low_stock_alert_threshold: i64,
}

/// Tema tampilan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Ocean,
    Forest,
    Royal,
    Sunset,
    Crimson,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::Ocean,
        Theme::Forest,
        Theme::Royal,
        Theme::Sunset,
        Theme::Crimson,
        Theme::Dark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Ocean => "ocean",
            Theme::Forest => "forest",
            Theme::Royal => "royal",
            Theme::Sunset => "sunset",
            Theme::Crimson => "crimson",
            Theme::Dark => "dark",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Theme::Ocean => "Ocean Blue",
            Theme::Forest => "Forest Green",
            Theme::Royal => "Royal Purple",
            Theme::Sunset => "Sunset Orange",
            Theme::Crimson => "Crimson Red",
            Theme::Dark => "Dark Mode",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s.trim().to_lowercase())
    }
}

/// Tema beserta nama tampilannya, untuk pilihan di UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeOption {
    pub id: Theme,
    pub display_name: String,
}
