//! 이메일 발송 협력자
//!
//! - [`LogEmailSender`] - 개발 환경용. 링크를 로그로 남깁니다
//! - [`HttpEmailSender`] - `EMAIL_API_URL`로 JSON POST. 백그라운드 작업으로 보내므로
//!   API 응답 시간이 메일 제공자에 좌우되지 않습니다
//! - `RecordingEmailSender` - 테스트에서 발송 내용을 검사합니다

use async_trait::async_trait;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::core::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    /// 본문에 포함된 동작 링크 (인증, 재설정)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError>;
}

/// 발송 대신 로그에 남기는 구현
#[derive(Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        log::info!(
            "📧 [메일] to={} subject={:?} link={}",
            message.to,
            message.subject,
            message.action_url.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboundEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// HTTP 메일 API 발송기
pub struct HttpEmailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpEmailSender {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }

    /// `EMAIL_API_URL`이 없으면 `None`
    pub fn from_env() -> Option<Self> {
        EmailConfig::api_url().map(|url| Self::new(url, EmailConfig::api_key(), EmailConfig::from_address()))
    }

    async fn deliver(
        client: reqwest::Client,
        api_url: String,
        api_key: Option<String>,
        from: String,
        message: EmailMessage,
    ) -> Result<(), AppError> {
        let payload = OutboundEmail {
            from: &from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
        };

        let mut request = client.post(&api_url).json(&payload);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("메일 API 요청 실패: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "메일 API 응답 오류 {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        let client = self.client.clone();
        let api_url = self.api_url.clone();
        let api_key = self.api_key.clone();
        let from = self.from.clone();
        let to = message.to.clone();

        actix_web::rt::spawn(async move {
            if let Err(e) = Self::deliver(client, api_url, api_key, from, message).await {
                log::error!("메일 발송 실패 (to={}): {}", to, e);
            }
        });

        Ok(())
    }
}

/// 발송된 메시지를 모아 두는 테스트용 구현
#[cfg(test)]
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: std::sync::Mutex<Vec<EmailMessage>>,
}

#[cfg(test)]
impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_to(&self, to: &str) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to == to)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// 마지막으로 받은 메일 링크의 `token` 쿼리 값
    pub fn last_token_for(&self, to: &str) -> Option<String> {
        let url = self.sent_to(to).last()?.action_url.clone()?;
        let encoded = url.split("token=").nth(1)?;
        urlencoding::decode(encoded).ok().map(|t| t.into_owned())
    }

    /// 백그라운드 발송을 기다립니다 (최대 약 1초).
    pub async fn wait_for(&self, to: &str, count: usize) -> Vec<EmailMessage> {
        for _ in 0..200 {
            let sent = self.sent_to(to);
            if sent.len() >= count {
                return sent;
            }
            actix_web::rt::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        self.sent_to(to)
    }
}

#[cfg(test)]
#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_recording_sender_extracts_token() {
        let sender = RecordingEmailSender::new();
        sender
            .send(EmailMessage {
                to: "a@x.io".into(),
                subject: "verify".into(),
                text: "click".into(),
                action_url: Some("http://app/verify-email?token=ab%2Dc_".into()),
            })
            .await
            .unwrap();

        assert_eq!(sender.last_token_for("a@x.io").as_deref(), Some("ab-c_"));
        assert_eq!(sender.count(), 1);
        assert!(sender.last_token_for("b@x.io").is_none());
    }

    #[actix_web::test]
    async fn test_http_sender_does_not_block_on_unreachable_provider() {
        let sender = HttpEmailSender::new("http://127.0.0.1:9/send".into(), None, "no-reply@x.io".into());
        let message = EmailMessage {
            to: "a@x.io".into(),
            subject: "s".into(),
            text: "t".into(),
            action_url: None,
        };
        assert!(sender.send(message).await.is_ok());
    }
}
