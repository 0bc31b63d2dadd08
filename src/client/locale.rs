//! Supported locales and their upstream service namespaces

use crate::error::TourError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Ko,
    En,
    Ja,
    Zh,
    De,
    Fr,
}

impl Locale {
    pub const ALL: [Locale; 6] = [
        Locale::Ko,
        Locale::En,
        Locale::Ja,
        Locale::Zh,
        Locale::De,
        Locale::Fr,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::Ko => "ko",
            Locale::En => "en",
            Locale::Ja => "ja",
            Locale::Zh => "zh",
            Locale::De => "de",
            Locale::Fr => "fr",
        }
    }

    /// Upstream service namespace for this locale
    pub fn service_name(&self) -> &'static str {
        match self {
            Locale::Ko => "KorService2",
            Locale::En => "EngService2",
            Locale::Ja => "JpnService2",
            Locale::Zh => "ChsService2",
            Locale::De => "GerService2",
            Locale::Fr => "FreService2",
        }
    }

    pub fn timeout_message(&self) -> &'static str {
        match self {
            Locale::Ko => "API 요청이 타임아웃되었습니다. 네트워크 상태를 확인하세요.",
            Locale::En => "The request timed out. Please check your network connection.",
            Locale::Ja => "リクエストがタイムアウトしました。ネットワーク接続を確認してください。",
            Locale::Zh => "请求超时。请检查网络连接。",
            Locale::De => "Zeitüberschreitung der Anfrage. Bitte überprüfen Sie Ihre Netzwerkverbindung.",
            Locale::Fr => "La requête a expiré. Veuillez vérifier votre connexion réseau.",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Locale::Ko => "데이터를 불러오는데 실패했습니다.",
            Locale::En => "Failed to load data.",
            Locale::Ja => "データの読み込みに失敗しました。",
            Locale::Zh => "加载数据失败。",
            Locale::De => "Daten konnten nicht geladen werden.",
            Locale::Fr => "Échec du chargement des données.",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = TourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TourError::Validation(format!("Unsupported language: {}", s)))
    }
}
