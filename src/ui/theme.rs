use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const THEME_NAMES: &[&str] = &["light", "dark", "retro"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Retro,
}

impl Theme {
    /// Unknown names fall back to light.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Theme::Dark,
            "retro" => Theme::Retro,
            _ => Theme::Light,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Retro => "retro",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Retro,
            Theme::Retro => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemePalette {
    pub app_bg: Color,
    pub text: Color,
    pub dim_text: Color,
    pub accent: Color,
    pub border: Color,
    pub selected_bg: Color,
    pub header_bg: Color,
    pub status_bg: Color,
    pub error_fg: Color,
    pub warn_fg: Color,
    pub ok_fg: Color,
    pub star: Color,
}

pub fn palette_for(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Light => ThemePalette {
            app_bg: Color::Rgb(250, 250, 250),
            text: Color::Rgb(30, 30, 36),
            dim_text: Color::Rgb(110, 110, 120),
            accent: Color::Rgb(9, 105, 218),
            border: Color::Rgb(208, 215, 222),
            selected_bg: Color::Rgb(221, 235, 255),
            header_bg: Color::Rgb(240, 242, 245),
            status_bg: Color::Rgb(232, 234, 238),
            error_fg: Color::Rgb(207, 34, 46),
            warn_fg: Color::Rgb(154, 103, 0),
            ok_fg: Color::Rgb(26, 127, 55),
            star: Color::Rgb(191, 135, 0),
        },
        Theme::Dark => ThemePalette {
            app_bg: Color::Rgb(18, 18, 22),
            text: Color::Rgb(230, 230, 235),
            dim_text: Color::Rgb(125, 125, 140),
            accent: Color::Rgb(88, 166, 255),
            border: Color::Rgb(55, 55, 70),
            selected_bg: Color::Rgb(40, 44, 62),
            header_bg: Color::Rgb(25, 25, 32),
            status_bg: Color::Rgb(30, 30, 40),
            error_fg: Color::LightRed,
            warn_fg: Color::Rgb(210, 153, 34),
            ok_fg: Color::Rgb(63, 185, 80),
            star: Color::Rgb(227, 179, 65),
        },
        Theme::Retro => ThemePalette {
            app_bg: Color::Rgb(12, 8, 28),
            text: Color::Rgb(0, 255, 170),
            dim_text: Color::Rgb(120, 90, 200),
            accent: Color::Rgb(255, 0, 200),
            border: Color::Rgb(0, 200, 255),
            selected_bg: Color::Rgb(50, 20, 80),
            header_bg: Color::Rgb(30, 10, 50),
            status_bg: Color::Rgb(25, 10, 45),
            error_fg: Color::Rgb(255, 60, 60),
            warn_fg: Color::Rgb(255, 230, 0),
            ok_fg: Color::Rgb(0, 255, 120),
            star: Color::Rgb(255, 230, 0),
        },
    }
}
