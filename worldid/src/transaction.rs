use serde_json::Value;

/// A MiniKit payment as reported by the developer portal.
#[derive(Debug, Clone, PartialEq)]
pub struct MiniKitTransaction {
    pub reference: Option<String>,
    pub status: Option<String>,
    pub raw: Value,
}

impl MiniKitTransaction {
    pub fn from_json(raw: Value) -> Self {
        let field = |name: &str| raw.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            reference: field("reference"),
            status: field("status").or_else(|| field("transactionStatus")),
            raw,
        }
    }

    /// Whether the chain reported the payment as failed or reverted.
    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_deref(), Some("failed") | Some("reverted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_status_and_reference() {
        let tx = MiniKitTransaction::from_json(json!({"reference": "r1", "status": "mined"}));
        assert_eq!(tx.reference.as_deref(), Some("r1"));
        assert!(!tx.is_failed());
        let tx = MiniKitTransaction::from_json(json!({"transactionStatus": "reverted"}));
        assert!(tx.is_failed());
        assert_eq!(tx.reference, None);
    }
}
