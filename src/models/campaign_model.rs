use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Frecuencia con la que se dispara una campaña dentro de su ventana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    Daily,
    Weekly,
    Monthly,
}

impl Periodicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
            Periodicity::Monthly => "monthly",
        }
    }

    /// Paso que se suma a `start_time` tras cada pasada. Un mes son 30 días fijos.
    pub fn step(&self) -> Duration {
        match self {
            Periodicity::Daily => Duration::days(1),
            Periodicity::Weekly => Duration::days(7),
            Periodicity::Monthly => Duration::days(30),
        }
    }

    pub fn advance(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + self.step()
    }
}

impl FromStr for Periodicity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Periodicity::Daily),
            "weekly" => Ok(Periodicity::Weekly),
            "monthly" => Ok(Periodicity::Monthly),
            other => Err(format!("unknown periodicity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Created,
    Started,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Created => "created",
            CampaignStatus::Started => "started",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(CampaignStatus::Created),
            "started" => Ok(CampaignStatus::Started),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(format!("unknown campaign status '{other}'")),
        }
    }
}

/// Posición de `now` respecto a `[start_time, end_time]` de la campaña.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    Before,
    Inside,
    After,
    /// Justo en `start_time` o `end_time`.
    Boundary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub periodicity: Periodicity,
    pub status: CampaignStatus,
    pub template_id: Option<String>,
    pub recipient_ids: Vec<String>,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn window_position(&self, now: DateTime<Utc>) -> WindowPosition {
        if self.start_time < now && now < self.end_time {
            WindowPosition::Inside
        } else if now > self.end_time {
            WindowPosition::After
        } else if now < self.start_time {
            WindowPosition::Before
        } else {
            WindowPosition::Boundary
        }
    }

    /// Estado que implica la ventana; `None` en un borde (se conserva el estado).
    pub fn derived_status(&self, now: DateTime<Utc>) -> Option<CampaignStatus> {
        match self.window_position(now) {
            WindowPosition::Inside => Some(CampaignStatus::Started),
            WindowPosition::After => Some(CampaignStatus::Completed),
            WindowPosition::Before => Some(CampaignStatus::Created),
            WindowPosition::Boundary => None,
        }
    }
}

/// Body de POST /api/campaigns. El estado nunca viene del cliente.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub periodicity: Periodicity,
    pub template_id: Option<String>,
    #[serde(default)]
    pub recipient_ids: Vec<String>,
}

/// Body de PUT /api/campaigns/{id}; los campos ausentes no se tocan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaignRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub periodicity: Option<Periodicity>,
    /// `Some(None)` quita la plantilla.
    #[serde(default, with = "double_option")]
    pub template_id: Option<Option<String>>,
    pub recipient_ids: Option<Vec<String>>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}
