/// 가십 메시지 직렬화
/// 형식: {"kind":"Bid","name":"pic1","price":"75.5"}
/// 서명, 순번, 발신자 필드는 없다. 발신자는 연결에서 결정된다.
// region:    --- Imports
use crate::auction::{EventKind, Proposal};
use crate::error::DecodeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// endregion: --- Imports

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireMessage {
    kind: EventKind,
    name: String,
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
}

/// 이름/가격 검증
/// 로컬 커맨드도 같은 검사를 거쳐야 수신 측에서 폐기되는 동작이 전파되지 않는다.
pub fn validate_fields(name: &str, price: Decimal) -> Result<(), DecodeError> {
    if name.is_empty() {
        return Err(DecodeError::EmptyName);
    }
    if name.chars().any(char::is_whitespace) {
        return Err(DecodeError::InvalidName(name.to_string()));
    }
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DecodeError::NegativePrice(price));
    }
    Ok(())
}

pub fn encode(proposal: &Proposal) -> Vec<u8> {
    let message = WireMessage {
        kind: proposal.kind(),
        name: proposal.name().to_string(),
        price: proposal.price(),
    };
    // 문자열 키와 단순 값만 있는 구조체는 직렬화에 실패하지 않는다.
    serde_json::to_vec(&message).unwrap_or_default()
}

pub fn decode(payload: &[u8]) -> Result<Proposal, DecodeError> {
    let message: WireMessage = serde_json::from_slice(payload)?;
    validate_fields(&message.name, message.price)?;
    Ok(Proposal::new(message.kind, message.name, message.price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn price_travels_as_text() {
        let proposal = Proposal::Bid {
            name: "pic1".to_string(),
            price: Decimal::from_str("75.5").unwrap(),
        };
        let payload = encode(&proposal);
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["kind"], "Bid");
        assert_eq!(value["price"], "75.5");
        assert_eq!(decode(&payload).unwrap(), proposal);
    }

    #[test]
    fn rejects_unknown_kind_and_extra_fields() {
        assert!(matches!(
            decode(br#"{"kind":"Withdraw","name":"pic1","price":"1"}"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode(br#"{"kind":"Bid","name":"pic1","price":"1","actor":"mallory"}"#),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_bad_names_and_prices() {
        assert!(matches!(
            decode(br#"{"kind":"Bid","name":"","price":"1"}"#),
            Err(DecodeError::EmptyName)
        ));
        assert!(matches!(
            decode(br#"{"kind":"Bid","name":"a b","price":"1"}"#),
            Err(DecodeError::InvalidName(_))
        ));
        assert!(matches!(
            decode(br#"{"kind":"Bid","name":"pic1","price":"-3"}"#),
            Err(DecodeError::NegativePrice(_))
        ));
        assert!(matches!(
            decode(br#"{"kind":"Bid","name":"pic1","price":"lots"}"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(decode(b"not json"), Err(DecodeError::Malformed(_))));
    }
}
