use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::{as_bool, as_int, field};

pub const DEFAULT_SERVER_TAP_PORT: u16 = 4570;
pub const DEFAULT_SERVER_TAP_BASE: &str = "http://localhost:4570";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinsHotkeys {
    pub inc: String,
    pub dec: String,
    pub reset: String,
}

impl Default for WinsHotkeys {
    fn default() -> Self {
        Self {
            inc: "CommandOrControl+Up".to_string(),
            dec: "CommandOrControl+Down".to_string(),
            reset: "CommandOrControl+0".to_string(),
        }
    }
}

/// Per-profile preferences (`prefs.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prefs {
    pub tts_enabled: bool,
    pub tts_voice: String,
    pub server_tap_host: String,
    pub server_tap_port: u16,
    pub wins_hotkeys: WinsHotkeys,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            tts_enabled: true,
            tts_voice: "default".to_string(),
            server_tap_host: String::new(),
            server_tap_port: DEFAULT_SERVER_TAP_PORT,
            wins_hotkeys: WinsHotkeys::default(),
        }
    }
}

fn sanitize_host(host: &str) -> String {
    host.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'))
        .collect()
}

fn port_of(raw: &Value) -> Option<u16> {
    as_int(raw).filter(|p| (1..=65535).contains(p)).map(|p| p as u16)
}

fn hotkeys_of(raw: &Value) -> WinsHotkeys {
    let def = WinsHotkeys::default();
    let key = |name: &str, fallback: String| {
        field(raw, name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback)
    };
    WinsHotkeys {
        inc: key("inc", def.inc),
        dec: key("dec", def.dec),
        reset: key("reset", def.reset),
    }
}

impl Prefs {
    pub fn from_value(raw: &Value) -> Self {
        let mut prefs = Self::default();
        prefs.apply_patch(raw);
        prefs
    }

    /// Applies the recognised fields of an operator update.
    pub fn apply_patch(&mut self, raw: &Value) {
        if let Some(flag) = field(raw, "ttsEnabled").and_then(as_bool) {
            self.tts_enabled = flag;
        }
        if let Some(voice) = field(raw, "ttsVoice").and_then(Value::as_str) {
            self.tts_voice = voice.to_string();
        }
        if let Some(host) = field(raw, "serverTapHost").and_then(Value::as_str) {
            self.server_tap_host = sanitize_host(host);
        }
        if let Some(port) = field(raw, "serverTapPort").and_then(port_of) {
            self.server_tap_port = port;
        }
        if let Some(hk) = field(raw, "winsHotkeys").filter(|v| v.is_object()) {
            self.wins_hotkeys = hotkeys_of(hk);
        }
    }

    /// Base URL of the external command sink: the configured host wins, then
    /// the process-level override, then the local default.
    pub fn server_tap_base(&self, env_override: Option<&str>) -> String {
        if !self.server_tap_host.is_empty() {
            return format!("http://{}:{}", self.server_tap_host, self.server_tap_port);
        }
        match env_override.map(|u| u.trim().trim_end_matches('/')) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => DEFAULT_SERVER_TAP_BASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn host_and_port_are_sanitized() {
        let mut prefs = Prefs::default();
        prefs.apply_patch(&json!({"serverTapHost": " mc.local/<x> ", "serverTapPort": 70000}));
        assert_eq!(prefs.server_tap_host, "mc.localx");
        assert_eq!(prefs.server_tap_port, DEFAULT_SERVER_TAP_PORT);
        prefs.apply_patch(&json!({"serverTapPort": "25575"}));
        assert_eq!(prefs.server_tap_base(None), "http://mc.localx:25575");
    }

    #[test]
    fn base_url_resolution_order() {
        let prefs = Prefs::default();
        assert_eq!(prefs.server_tap_base(None), DEFAULT_SERVER_TAP_BASE);
        assert_eq!(prefs.server_tap_base(Some("http://tap:9000//")), "http://tap:9000");
        assert_eq!(prefs.server_tap_base(Some("  ")), DEFAULT_SERVER_TAP_BASE);
    }
}
