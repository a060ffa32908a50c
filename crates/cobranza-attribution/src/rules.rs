use chrono::{Datelike, Duration, NaiveDateTime};
use cobranza_core::{ManagementAction, Substate, day_gap};

/// Thresholds of the attribution rule set.
#[derive(Debug, Clone)]
pub struct AttributionRules {
    /// Added to the payment time before comparing against action times.
    pub grace_offset: Duration,
    /// Delinquency at or below this is worked per month/campaign.
    pub fresh_delinquency_days: i64,
    /// Above this delinquency a sent text message no longer counts.
    pub text_message_cutoff_days: i64,
    pub window_days: i64,
}

impl Default for AttributionRules {
    fn default() -> Self {
        Self {
            grace_offset: Duration::hours(5),
            fresh_delinquency_days: 61,
            text_message_cutoff_days: 90,
            window_days: 30,
        }
    }
}

impl AttributionRules {
    pub fn cutoff(&self, paid_at: NaiveDateTime) -> NaiveDateTime {
        paid_at + self.grace_offset
    }

    pub fn is_secondary_effective(&self, substate: Substate, days_past_due: Option<i64>) -> bool {
        if !substate.is_secondary_effective() {
            return false;
        }
        !(substate == Substate::TextMessageSent && self.beyond_text_cutoff(days_past_due))
    }

    pub fn is_effective(&self, substate: Substate, days_past_due: Option<i64>) -> bool {
        substate.is_priority() || self.is_secondary_effective(substate, days_past_due)
    }

    /// Recorded age of the action carried forward to the payment date.
    pub fn projected_days_past_due(
        &self,
        action: &ManagementAction,
        paid_at: NaiveDateTime,
    ) -> Option<i64> {
        action
            .days_past_due
            .map(|age| age + day_gap(action.created_at.date(), paid_at.date()))
    }

    pub fn within_window(
        &self,
        action: &ManagementAction,
        paid_at: NaiveDateTime,
        days_past_due: Option<i64>,
        campaign_id: Option<i64>,
    ) -> bool {
        let gap = day_gap(action.created_at.date(), paid_at.date());

        match days_past_due {
            Some(age) if age <= self.fresh_delinquency_days => {
                let same_month = action.created_at.year() == paid_at.year()
                    && action.created_at.month() == paid_at.month();
                let same_campaign = campaign_id.is_some() && action.campaign_id == campaign_id;
                same_month || same_campaign
            }
            Some(_) => gap <= self.window_days,
            None => {
                if gap > self.window_days {
                    return false;
                }
                let Some(projected) = self.projected_days_past_due(action, paid_at) else {
                    return false;
                };
                projected > self.fresh_delinquency_days
                    && !(action.substate == Substate::TextMessageSent
                        && projected > self.text_message_cutoff_days)
            }
        }
    }

    fn beyond_text_cutoff(&self, days_past_due: Option<i64>) -> bool {
        days_past_due.is_some_and(|age| age > self.text_message_cutoff_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{action, at};

    #[test]
    fn text_messages_drop_out_past_ninety_days() {
        let rules = AttributionRules::default();

        assert!(rules.is_secondary_effective(Substate::TextMessageSent, Some(90)));
        assert!(!rules.is_secondary_effective(Substate::TextMessageSent, Some(91)));
        assert!(rules.is_secondary_effective(Substate::TextMessageSent, None));
        assert!(rules.is_secondary_effective(Substate::PromiseToPay, Some(400)));
    }

    #[test]
    fn projection_adds_the_day_gap() {
        let rules = AttributionRules::default();
        let promise = action(1, "2024-03-01 08:00:00", Substate::PromiseToPay, Some(50), None);

        assert_eq!(
            rules.projected_days_past_due(&promise, at("2024-03-15 10:00:00")),
            Some(64)
        );
    }

    #[test]
    fn unknown_age_never_passes_the_no_context_window() {
        let rules = AttributionRules::default();
        let promise = action(1, "2024-03-10 08:00:00", Substate::PromiseToPay, None, None);

        assert!(!rules.within_window(&promise, at("2024-03-15 10:00:00"), None, None));
    }
}
