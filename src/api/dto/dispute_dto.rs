//! Dispute and admin endpoint DTOs.
//!
//! The wire format keeps the upstream resolution codes
//! (`RESOLVED_REFUND`, ...) and flat `refund_percentage` /
//! `target_user_id` fields; [`ResolveDisputeRequest::to_domain`]
//! converts them into the construction-checked domain sum types, so an
//! inconsistent combination never reaches the service layer.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::dispute::{AdminAction, DisputeStatus, Resolution};
use crate::domain::ids::UserId;
use crate::error::CoreError;

/// Query parameters for `GET /disputes`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DisputeListParams {
    /// Only disputes in this status.
    #[serde(default)]
    pub status: Option<DisputeStatus>,
}

/// Request body for `POST /matches/{id}/disputes`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenDisputeRequest {
    /// The participant opening the dispute.
    pub opener_id: uuid::Uuid,
    /// Short machine-friendly reason (e.g. `"no_show"`).
    pub reason: String,
    /// Free-form account of what happened.
    #[serde(default)]
    pub description: String,
}

/// Wire codes for a dispute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionCode {
    /// Full refund of the total price.
    ResolvedRefund,
    /// Partial refund; requires `refund_percentage`.
    ResolvedPartialRefund,
    /// No money moves.
    ResolvedNoRefund,
    /// Dismissed without a decision on the merits.
    Closed,
}

/// Wire codes for the admin penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminActionCode {
    /// No penalty.
    None,
    /// Formal warning; requires `target_user_id`.
    Warning,
    /// One strike; requires `target_user_id`.
    Strike,
    /// Immediate ban; requires `target_user_id`.
    Ban,
    /// Listing content removal.
    RemoveContent,
}

/// Request body for `POST /disputes/{id}/resolve`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveDisputeRequest {
    /// Resolution code.
    pub resolution: ResolutionCode,
    /// Required iff `resolution` is `RESOLVED_PARTIAL_REFUND`.
    #[serde(default)]
    pub refund_percentage: Option<u8>,
    /// Penalty to apply to the at-fault user.
    pub admin_action: AdminActionCode,
    /// Required for `warning`, `strike`, and `ban`.
    #[serde(default)]
    pub target_user_id: Option<uuid::Uuid>,
    /// Notes attached to the resolution.
    #[serde(default)]
    pub admin_notes: Option<String>,
}

impl ResolveDisputeRequest {
    /// Converts the wire fields into the domain sum types.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for a partial refund without
    /// a valid percentage, a percentage on a non-partial resolution, or a
    /// penalty without a target user.
    pub fn to_domain(&self) -> Result<(Resolution, AdminAction), CoreError> {
        let resolution = match self.resolution {
            ResolutionCode::ResolvedRefund => {
                if self.refund_percentage.is_some_and(|pct| pct != 100) {
                    return Err(CoreError::InvalidRequest(
                        "RESOLVED_REFUND implies 100%; omit refund_percentage".to_string(),
                    ));
                }
                Resolution::Refund
            }
            ResolutionCode::ResolvedPartialRefund => {
                let Some(pct) = self.refund_percentage else {
                    return Err(CoreError::InvalidRequest(
                        "RESOLVED_PARTIAL_REFUND requires refund_percentage".to_string(),
                    ));
                };
                Resolution::partial(pct)?
            }
            ResolutionCode::ResolvedNoRefund | ResolutionCode::Closed => {
                if self.refund_percentage.is_some() {
                    return Err(CoreError::InvalidRequest(
                        "refund_percentage does not apply to this resolution".to_string(),
                    ));
                }
                if self.resolution == ResolutionCode::Closed {
                    Resolution::Closed
                } else {
                    Resolution::NoRefund
                }
            }
        };

        let target = self.target_user_id.map(UserId::from_uuid);
        let admin_action = match self.admin_action {
            AdminActionCode::None => AdminAction::None,
            AdminActionCode::RemoveContent => AdminAction::RemoveContent,
            AdminActionCode::Warning => AdminAction::Warning {
                user_id: required_target(target, "warning")?,
            },
            AdminActionCode::Strike => AdminAction::Strike {
                user_id: required_target(target, "strike")?,
            },
            AdminActionCode::Ban => AdminAction::Ban {
                user_id: required_target(target, "ban")?,
            },
        };
        Ok((resolution, admin_action))
    }
}

fn required_target(target: Option<UserId>, action: &str) -> Result<UserId, CoreError> {
    target.ok_or_else(|| {
        CoreError::InvalidRequest(format!("admin action '{action}' requires target_user_id"))
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn request(
        resolution: ResolutionCode,
        refund_percentage: Option<u8>,
        admin_action: AdminActionCode,
        target_user_id: Option<uuid::Uuid>,
    ) -> ResolveDisputeRequest {
        ResolveDisputeRequest {
            resolution,
            refund_percentage,
            admin_action,
            target_user_id,
            admin_notes: None,
        }
    }

    #[test]
    fn partial_requires_percentage() {
        let req = request(
            ResolutionCode::ResolvedPartialRefund,
            None,
            AdminActionCode::None,
            None,
        );
        assert!(req.to_domain().is_err());

        let req = request(
            ResolutionCode::ResolvedPartialRefund,
            Some(50),
            AdminActionCode::None,
            None,
        );
        let Ok((resolution, _)) = req.to_domain() else {
            panic!("valid partial refund must convert");
        };
        assert_eq!(resolution.refund_percentage(), Some(50));
    }

    #[test]
    fn percentage_rejected_on_no_refund() {
        let req = request(
            ResolutionCode::ResolvedNoRefund,
            Some(30),
            AdminActionCode::None,
            None,
        );
        assert!(req.to_domain().is_err());
    }

    #[test]
    fn strike_requires_target() {
        let req = request(
            ResolutionCode::ResolvedNoRefund,
            None,
            AdminActionCode::Strike,
            None,
        );
        assert!(req.to_domain().is_err());

        let target = uuid::Uuid::new_v4();
        let req = request(
            ResolutionCode::ResolvedNoRefund,
            None,
            AdminActionCode::Strike,
            Some(target),
        );
        let Ok((_, action)) = req.to_domain() else {
            panic!("valid strike must convert");
        };
        assert_eq!(action.target(), Some(UserId::from_uuid(target)));
    }

    #[test]
    fn wire_codes_deserialize() {
        let Ok(code) = serde_json::from_str::<ResolutionCode>("\"RESOLVED_PARTIAL_REFUND\"") else {
            panic!("wire code must parse");
        };
        assert_eq!(code, ResolutionCode::ResolvedPartialRefund);

        let Ok(action) = serde_json::from_str::<AdminActionCode>("\"remove_content\"") else {
            panic!("wire code must parse");
        };
        assert_eq!(action, AdminActionCode::RemoveContent);
    }
}
