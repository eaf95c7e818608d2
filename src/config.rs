//! 設定ファイル管理モジュール
//!
//! コントローラとドライブの設定をJSON形式で永続化

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DiskError, Result};

/// 設定ファイルのデフォルトファイル名
pub const CONFIG_FILENAME: &str = "disk2_config.json";

/// 実行ファイルのディレクトリを取得
pub fn get_exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 相対パスを指定されたベースディレクトリからの絶対パスに解決
pub fn resolve_path_with_base(base: &str, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else if base.is_empty() {
        get_exe_dir().join(relative)
    } else {
        let base_path = Path::new(base);
        if base_path.is_absolute() {
            base_path.join(relative)
        } else {
            get_exe_dir().join(base).join(relative)
        }
    }
}

/// 設定ファイルのパスを取得
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join(CONFIG_FILENAME)
}

/// ドライブ設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveConfig {
    /// NIBイメージのパス
    #[serde(default)]
    pub image: Option<String>,
    /// 書き込みプロテクト
    #[serde(default)]
    pub write_protected: bool,
}

/// コントローラ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// 相対パスの基準ディレクトリ
    /// 空または未設定の場合は実行ファイルのディレクトリを使用
    #[serde(default)]
    pub home: String,
    /// カードを挿すスロット (1-7)
    #[serde(default = "default_slot")]
    pub slot: u8,
    /// ドライブ1
    #[serde(default)]
    pub drive1: DriveConfig,
    /// ドライブ2
    #[serde(default)]
    pub drive2: DriveConfig,
    /// ブートROM (256 bytes)
    #[serde(default)]
    pub boot_rom: Option<String>,
    /// 異常なフェーズ励磁で停止するか
    #[serde(default)]
    pub halt_on_fault: bool,
    /// ディスクログレベル: none, flow, state, decide, nibble, all
    #[serde(default = "default_disk_log")]
    pub disk_log: String,
}

fn default_slot() -> u8 { 6 }
fn default_disk_log() -> String { "none".to_string() }

impl Default for Config {
    fn default() -> Self {
        Config {
            home: String::new(),
            slot: default_slot(),
            drive1: DriveConfig::default(),
            drive2: DriveConfig::default(),
            boot_rom: None,
            halt_on_fault: false,
            disk_log: default_disk_log(),
        }
    }
}

impl Config {
    /// オプション指定で設定ファイルを読み込む
    /// 優先順位:
    /// 1. config_path が指定されている場合はそれを使用
    /// 2. home_path が指定されている場合は home_path/disk2_config.json を探す
    /// 3. 実行ファイルディレクトリの disk2_config.json
    ///
    /// home_path が指定されている場合、読み込んだ設定の home を上書き
    pub fn load_with_options(config_path: Option<&str>, home_path: Option<&str>) -> (Self, PathBuf) {
        let config_file_path = if let Some(path) = config_path {
            PathBuf::from(path)
        } else if let Some(home) = home_path {
            let home_config = Path::new(home).join(CONFIG_FILENAME);
            if home_config.exists() {
                home_config
            } else {
                get_config_path()
            }
        } else {
            get_config_path()
        };

        let mut config = Self::load_from(&config_file_path);

        // コマンドラインのhome指定を優先
        if let Some(home) = home_path {
            config.home = home.to_string();
        }

        (config, config_file_path)
    }

    /// 指定したパスから設定を読み込む（無い/壊れている場合はデフォルト）
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(content) => match Self::from_json(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("{} ({:?}), using defaults", e, path.as_ref());
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// JSON文字列から読み込む
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| DiskError::Config(format!("Failed to parse config: {}", e)))
    }

    /// 指定したパスに設定を保存する
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DiskError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 相対パスをhomeからの絶対パスに解決
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        resolve_path_with_base(&self.home, relative)
    }

    /// ドライブ番号(0/1)の設定
    pub fn drive(&self, index: usize) -> Option<&DriveConfig> {
        match index {
            0 => Some(&self.drive1),
            1 => Some(&self.drive2),
            _ => None,
        }
    }
}
