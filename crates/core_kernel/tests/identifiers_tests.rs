//! Unit tests for the Identifiers module

use core_kernel::{
    ApprovalId, AuditEventId, ClaimId, CustomerId, DeductionId, MatchId, TenantId,
};
use uuid::Uuid;

mod claim_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(ClaimId::new(), ClaimId::new());
    }

    #[test]
    fn test_display_includes_prefix() {
        let uuid = Uuid::new_v4();
        let id = ClaimId::from_uuid(uuid);
        assert_eq!(id.to_string(), format!("CLM-{}", uuid));
    }

    #[test]
    fn test_parse_with_and_without_prefix() {
        let id = ClaimId::new();
        let with_prefix: ClaimId = id.to_string().parse().unwrap();
        let bare: ClaimId = id.as_uuid().to_string().parse().unwrap();
        assert_eq!(with_prefix, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("CLM-not-a-uuid".parse::<ClaimId>().is_err());
    }
}

mod ordering_tests {
    use super::*;

    #[test]
    fn test_ids_order_by_uuid() {
        let low = DeductionId::from_uuid(Uuid::from_u128(1));
        let high = DeductionId::from_uuid(Uuid::from_u128(2));
        assert!(low < high);
    }
}

mod prefix_tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(TenantId::prefix(), "TEN");
        assert_eq!(CustomerId::prefix(), "CUS");
        assert_eq!(ClaimId::prefix(), "CLM");
        assert_eq!(DeductionId::prefix(), "DED");
        assert_eq!(MatchId::prefix(), "MAT");
        assert_eq!(ApprovalId::prefix(), "APR");
        assert_eq!(AuditEventId::prefix(), "AUD");
    }

    #[test]
    fn test_uuid_conversion_round_trip() {
        let uuid = Uuid::new_v4();
        let id: ApprovalId = uuid.into();
        let back: Uuid = id.into();
        assert_eq!(back, uuid);
    }
}
