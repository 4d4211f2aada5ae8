use crate::snapshot::Snapshot;
use serde::{
    Deserialize,
    Serialize,
};

/// Messages sent by agents over the persistent connection.
///
/// The envelope keeps the event-name/payload split of the transport the
/// fleet's agents historically spoke: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum AgentMessage {
    /// Binds the connection to a logical host identity.
    Register { host: String },
    /// One telemetry reading. Ignored by the hub until the connection has
    /// registered.
    Snapshot(Snapshot),
}

/// Messages sent by the hub to agents and passive observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum HubMessage {
    /// Connection handshake.
    Hello { msg: String },
    /// Reply to a successful registration.
    Registered { host: String },
    /// The full set of currently registered host identities, re-broadcast
    /// on every registration and disconnect.
    HostList { hosts: Vec<String> },
    /// A snapshot re-published to all subscribers, at most once.
    Telemetry(Snapshot),
    Error { message: String },
}

impl HubMessage {
    /// Serializes for the wire. The message types above cannot fail to
    /// serialize; a failure would mean a bug in the model itself.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"event":"error","data":{{"message":"serialize: {e}"}}}}"#)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn register_round_trips_with_original_event_name() {
        let raw = r#"{"event":"register","data":{"host":"pc-01"}}"#;
        let msg: AgentMessage = serde_json::from_str(raw).unwrap();
        match &msg {
            AgentMessage::Register { host } => assert_eq!(host, "pc-01"),
            other => panic!("unexpected message: {other:?}"),
        }
        assert_eq!(serde_json::to_string(&msg).unwrap(), raw);
    }

    #[test]
    fn snapshot_event_carries_extension_flags() {
        let raw = serde_json::json!({
            "event": "snapshot",
            "data": {
                "host": "pc-01",
                "idle_seconds": 12.5,
                "user_active": true,
                "processes": [{"pid": 7, "name": "excel.exe", "status": "running"}],
                "foreground_process": "excel.exe",
                "excel_running": true,
            },
        });

        let msg: AgentMessage = serde_json::from_value(raw).unwrap();
        let AgentMessage::Snapshot(snapshot) = msg else {
            panic!("expected snapshot");
        };
        assert_eq!(snapshot.extension("excel_running"), Some(true));
    }

    #[test]
    fn host_list_serializes_under_its_event_name() {
        let msg = HubMessage::HostList {
            hosts: vec!["pc-01".into(), "pc-02".into()],
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(value["event"], "host_list");
        assert_eq!(value["data"]["hosts"][1], "pc-02");
    }
}
