pub const STATE_PATH_ENV: &str = "VOICE_POLISH_STATE_PATH";
pub const STATE_DIR_NAME: &str = "VoicePolishInput";
pub const STATE_FILE_NAME: &str = "state.json";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8765;

pub const HISTORY_LIMIT: usize = 300;
pub const HISTORY_PREVIEW_LIMIT: usize = 100;

// Seed list written on first start; users edit it from the panel.
pub const DEFAULT_FILLERS: &[&str] = &[
  "えー",
  "え〜",
  "えぇ",
  "あの",
  "あのー",
  "あの〜",
  "えっと",
  "えっとー",
  "えっと〜",
  "その",
  "そのー",
  "その〜",
  "なんか",
];
