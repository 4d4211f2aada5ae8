use axum::extract::ws::Message;
use deskfleet_model::HubMessage;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("the agent payload could not be parsed: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("handling the websocket connection failed: {0}")]
    Socket(eyre::Report),
}

impl AppError {
    pub fn into_message(self) -> Message {
        Message::Text(
            HubMessage::Error {
                message: self.to_string(),
            }
            .to_json()
            .into(),
        )
    }
}
