use serde::{Deserialize, Serialize};

/// Outcome code recorded on a management action.
///
/// Stored as a SCREAMING_SNAKE_CASE code. Codes the engine does not know
/// map to [`Substate::Other`], which never counts as effective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Substate {
    PaymentOffer,
    PromiseToPay,
    PaymentAgreement,
    Negotiation,
    DirectContact,
    NotificationDelivered,
    TextMessageSent,
    VoicemailLeft,
    ThirdPartyContact,
    RefinancingRequest,
    PartialPayment,
    NoAnswer,
    WrongNumber,
    Unreachable,
    Other,
}

const SECONDARY_EFFECTIVE: [Substate; 10] = [
    Substate::PromiseToPay,
    Substate::PaymentAgreement,
    Substate::Negotiation,
    Substate::DirectContact,
    Substate::NotificationDelivered,
    Substate::TextMessageSent,
    Substate::VoicemailLeft,
    Substate::ThirdPartyContact,
    Substate::RefinancingRequest,
    Substate::PartialPayment,
];

impl Substate {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "PAYMENT_OFFER" => Self::PaymentOffer,
            "PROMISE_TO_PAY" => Self::PromiseToPay,
            "PAYMENT_AGREEMENT" => Self::PaymentAgreement,
            "NEGOTIATION" => Self::Negotiation,
            "DIRECT_CONTACT" => Self::DirectContact,
            "NOTIFICATION_DELIVERED" => Self::NotificationDelivered,
            "TEXT_MESSAGE_SENT" => Self::TextMessageSent,
            "VOICEMAIL_LEFT" => Self::VoicemailLeft,
            "THIRD_PARTY_CONTACT" => Self::ThirdPartyContact,
            "REFINANCING_REQUEST" => Self::RefinancingRequest,
            "PARTIAL_PAYMENT" => Self::PartialPayment,
            "NO_ANSWER" => Self::NoAnswer,
            "WRONG_NUMBER" => Self::WrongNumber,
            "UNREACHABLE" => Self::Unreachable,
            _ => Self::Other,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::PaymentOffer => "PAYMENT_OFFER",
            Self::PromiseToPay => "PROMISE_TO_PAY",
            Self::PaymentAgreement => "PAYMENT_AGREEMENT",
            Self::Negotiation => "NEGOTIATION",
            Self::DirectContact => "DIRECT_CONTACT",
            Self::NotificationDelivered => "NOTIFICATION_DELIVERED",
            Self::TextMessageSent => "TEXT_MESSAGE_SENT",
            Self::VoicemailLeft => "VOICEMAIL_LEFT",
            Self::ThirdPartyContact => "THIRD_PARTY_CONTACT",
            Self::RefinancingRequest => "REFINANCING_REQUEST",
            Self::PartialPayment => "PARTIAL_PAYMENT",
            Self::NoAnswer => "NO_ANSWER",
            Self::WrongNumber => "WRONG_NUMBER",
            Self::Unreachable => "UNREACHABLE",
            Self::Other => "OTHER",
        }
    }

    /// The single highest-priority outcome.
    pub fn is_priority(self) -> bool {
        self == Self::PaymentOffer
    }

    /// Membership in the fallback effective set, before any age-based exclusion.
    pub fn is_secondary_effective(self) -> bool {
        SECONDARY_EFFECTIVE.contains(&self)
    }
}
