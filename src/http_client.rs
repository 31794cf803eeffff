use crate::{
    config::Variant,
    error::ServiceError,
    service::{
        SlotService,
        SpinOutcome,
        WinCategory,
        WinDetail,
    },
    symbols::Symbol,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use std::time::Duration;

/// Talks to the slot server over HTTP. The cookie store keeps the
/// `slot_session` cookie, so every call lands on the same player.
#[derive(Clone)]
pub struct HttpSlotClient {
    base_url: String,
    variant: Variant,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SpinRequest {
    bet: u64,
}

#[derive(Debug, Deserialize)]
struct ClassicSpinDto {
    reels: Vec<Symbol>,
    win_amount: u64,
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct GrandSpinDto {
    grid: Vec<Vec<Symbol>>,
    win_amount: u64,
    balance: u64,
    #[serde(default)]
    win_details: Vec<WinDetail>,
    #[serde(default)]
    sound: WinCategory,
}

#[derive(Debug, Deserialize)]
struct StatusDto {
    balance: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorDto {
    detail: Option<serde_json::Value>,
}

impl From<ClassicSpinDto> for SpinOutcome {
    fn from(dto: ClassicSpinDto) -> Self {
        let won = dto.win_amount > 0;
        let reel_count = dto.reels.len() as u32;
        SpinOutcome {
            reels: dto.reels.into_iter().map(|symbol| vec![symbol]).collect(),
            win_amount: dto.win_amount,
            balance: dto.balance,
            // the classic server has a single line and does not name it
            win_details: if won {
                vec![WinDetail::new("Center", reel_count)]
            } else {
                Vec::new()
            },
            category: if won {
                WinCategory::Small
            } else {
                WinCategory::Lose
            },
        }
    }
}

impl From<GrandSpinDto> for SpinOutcome {
    fn from(dto: GrandSpinDto) -> Self {
        let outcome = SpinOutcome {
            reels: dto.grid,
            win_amount: dto.win_amount,
            balance: dto.balance,
            win_details: dto.win_details,
            category: dto.sound,
        };
        SpinOutcome {
            category: outcome.win_category(),
            ..outcome
        }
    }
}

impl HttpSlotClient {
    pub fn new(base_url: impl Into<String>, variant: Variant, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .wrap_err("failed to build HTTP client for slot server")?;
        Ok(Self {
            base_url,
            variant,
            http,
        })
    }

    async fn read<T: DeserializeOwned>(
        res: reqwest::Response,
    ) -> std::result::Result<T, ServiceError> {
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorDto>(&bytes)
                .ok()
                .and_then(|dto| dto.detail)
                .and_then(|detail| detail.as_str().map(str::to_string))
                .unwrap_or_else(|| "Server Error".to_string());
            return Err(ServiceError::Server {
                status: status.as_u16(),
                detail,
            });
        }
        serde_json::from_slice(&bytes).map_err(|err| ServiceError::Decode(err.to_string()))
    }
}

fn transport(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Transport("request timed out".to_string())
    } else {
        ServiceError::Transport(err.to_string())
    }
}

impl SlotService for HttpSlotClient {
    async fn spin(&self, wager: u64) -> std::result::Result<SpinOutcome, ServiceError> {
        let url = format!("{}/api/{}/spin", self.base_url, self.variant.api_name());
        tracing::debug!(%url, wager, "requesting spin");
        let res = self
            .http
            .post(url)
            .json(&SpinRequest { bet: wager })
            .send()
            .await
            .map_err(transport)?;
        match self.variant {
            Variant::Classic => Self::read::<ClassicSpinDto>(res).await.map(Into::into),
            Variant::Grand => Self::read::<GrandSpinDto>(res).await.map(Into::into),
        }
    }

    async fn status(&self) -> std::result::Result<u64, ServiceError> {
        let url = format!("{}/api/user/status", self.base_url);
        let res = self.http.get(url).send().await.map_err(transport)?;
        let dto: StatusDto = Self::read(res).await?;
        Ok(dto.balance)
    }

    async fn reset(&self) -> std::result::Result<(), ServiceError> {
        let url = format!("{}/api/user/reset", self.base_url);
        let res = self.http.post(url).send().await.map_err(transport)?;
        Self::read::<serde_json::Value>(res).await.map(|_| ())
    }
}
