use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context};
use axum::extract::{Form, State};
use axum::routing::{get, post};
use axum::Router;
use chrono::Datelike;
use reembolso_core::{DayMonthFormatter, ExpenseRecord, IntakeReply, Money, MonthNames, PayeeProfile};
use reembolso_ocr::toll::to_expense_record;
use reembolso_ocr::ScannedDocument;
use serde::Deserialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::state::{prune_idle, AppState};
use crate::twiml::MessagingResponse;

const MSG_PAYEE_SAVED: &str = "✅ Dados cadastrados! Agora envie uma imagem do cupom ou pedágio.";
const MSG_SEND_IMAGE: &str = "Olá! Por favor, envie uma imagem de um cupom fiscal ou extrato de pedágio.";
const MSG_QR_FAILED: &str = "❌ QR Code lido, mas falhou ao extrair os dados do site.";
const MSG_NO_TRANSACTIONS: &str = "❌ Imagem lida, mas não encontrei transações válidas.";
const MSG_NO_TEXT: &str = "❌ Não consegui ler nenhum texto na imagem.";
const MSG_UNEXPECTED: &str = "Ocorreu um erro inesperado. 😔 Tente novamente.";

/// Twilio's inbound-message form post (only the fields used here).
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "NumMedia", default)]
    pub num_media: u32,
    #[serde(rename = "MediaUrl0")]
    pub media_url: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/whatsapp", post(whatsapp))
        .route("/health", get(|| async { "ok" }))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn whatsapp(
    State(state): State<Arc<AppState>>,
    Form(msg): Form<InboundMessage>,
) -> MessagingResponse {
    MessagingResponse(respond(state, msg).await)
}

async fn respond(state: Arc<AppState>, msg: InboundMessage) -> String {
    let (reply, payee) = {
        let mut senders = state.senders.lock().await;
        prune_idle(&mut senders, state.config.intake_idle());
        let sender = senders.entry(msg.from.clone()).or_default();
        sender.last_seen = Instant::now();
        (sender.intake.respond(&msg.body), sender.payee.clone())
    };

    match reply {
        IntakeReply::Ask(question) => return question,
        IntakeReply::Completed(profile) => return save_payee(state, &msg.from, profile).await,
        IntakeReply::Done => {}
    }

    let media_url = match msg.media_url.as_deref() {
        Some(url) if msg.num_media > 0 => url,
        _ => return MSG_SEND_IMAGE.to_string(),
    };

    match handle_media(state, media_url, payee.as_ref()).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(from = %msg.from, error = ?e, "failed to process media");
            MSG_UNEXPECTED.to_string()
        }
    }
}

async fn save_payee(state: Arc<AppState>, from: &str, profile: PayeeProfile) -> String {
    let written = {
        let state = state.clone();
        let profile = profile.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let workbook = state.workbook.lock().map_err(|_| anyhow!("workbook lock poisoned"))?;
            workbook.write_payee(&profile)?;
            Ok(())
        })
        .await
    };

    match written {
        Ok(Ok(())) => {
            info!(%from, period = %profile.period, "intake completed");
            if let Some(sender) = state.senders.lock().await.get_mut(from) {
                sender.intake.confirm();
                sender.payee = Some(profile);
            }
            MSG_PAYEE_SAVED.to_string()
        }
        Ok(Err(e)) => {
            error!(%from, error = ?e, "failed to save payee");
            MSG_UNEXPECTED.to_string()
        }
        Err(e) => {
            error!(%from, error = ?e, "payee task panicked");
            MSG_UNEXPECTED.to_string()
        }
    }
}

async fn handle_media(
    state: Arc<AppState>,
    url: &str,
    payee: Option<&PayeeProfile>,
) -> anyhow::Result<String> {
    let twilio = &state.config.twilio;
    let bytes = state
        .http
        .get(url)
        .basic_auth(&twilio.account_sid, Some(&twilio.auth_token))
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    info!(size = bytes.len(), "media downloaded");

    process_image(state, bytes.to_vec(), payee).await
}

/// Scan one photo and file whatever it contains. Returns the reply text.
pub async fn process_image(
    state: Arc<AppState>,
    image: Vec<u8>,
    payee: Option<&PayeeProfile>,
) -> anyhow::Result<String> {
    let document = {
        let state = state.clone();
        tokio::task::spawn_blocking(move || state.pipeline.scan(&image))
            .await
            .context("scan task panicked")??
    };

    // Toll dates carry no year; take it from the declared period.
    let year = payee
        .map(|p| p.period.end.year())
        .unwrap_or_else(|| chrono::Local::now().year());
    let dates = DayMonthFormatter::new(MonthNames::pt_br(), year);

    match document {
        ScannedDocument::RetailQr { url } => {
            let receipt = match state.nfce.fetch(&url).await {
                Ok(r) if r.total.is_positive() => r,
                Ok(r) => {
                    warn!(%url, total = %r.total, "receipt page has no positive total");
                    return Ok(MSG_QR_FAILED.to_string());
                }
                Err(e) => {
                    warn!(%url, error = %e, "receipt page could not be read");
                    return Ok(MSG_QR_FAILED.to_string());
                }
            };
            append(state, vec![receipt.to_expense_record()], dates).await?;
            Ok(format!("✅ Cupom de '{}' ({}) processado!", receipt.vendor, receipt.total))
        }
        ScannedDocument::Toll { transactions, .. } if transactions.is_empty() => {
            Ok(MSG_NO_TRANSACTIONS.to_string())
        }
        ScannedDocument::Toll { transactions, .. } => {
            let records: Vec<_> = transactions.iter().map(to_expense_record).collect();
            let total: Money = records.iter().map(|r| r.amount).sum();
            let n = append(state, records, dates).await?;
            info!(transactions = n, %total, "toll statement filed");
            Ok(format!("✅ Extrato com {n} transações processado!"))
        }
        ScannedDocument::Unreadable => Ok(MSG_NO_TEXT.to_string()),
    }
}

async fn append(
    state: Arc<AppState>,
    records: Vec<ExpenseRecord>,
    dates: DayMonthFormatter,
) -> anyhow::Result<usize> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
        let workbook = state.workbook.lock().map_err(|_| anyhow!("workbook lock poisoned"))?;
        Ok(workbook.append_expenses(&records, &dates)?)
    })
    .await
    .context("append task panicked")?
}
