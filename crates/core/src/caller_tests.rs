use super::*;

#[test]
fn round_trips_client_with_uuid() {
    let id = Uuid::new_v4().to_string();
    let caller = Caller::client(id.clone());
    let sub = caller.to_sub();
    assert_eq!(sub, format!("client-{id}"));
    assert_eq!(Caller::from_str(&sub).unwrap(), caller);
}

#[test]
fn round_trips_anonymous_client() {
    let caller = Caller::anonymous_client();
    assert_eq!(caller.to_sub(), "client-anonymous");
    assert_eq!(Caller::from_str("client-anonymous").unwrap(), caller);
}

#[test]
fn round_trips_service_and_system() {
    let id = Uuid::new_v4().to_string();
    for caller in [Caller::service(id.clone()), Caller::system(id.clone())] {
        assert_eq!(Caller::from_str(&caller.to_sub()).unwrap(), caller);
    }
}

#[test]
fn rejects_unknown_type() {
    assert_eq!(
        Caller::from_str("robot-anonymous").unwrap_err(),
        ParseCallerError::UnknownType("robot".to_string())
    );
}

#[test]
fn rejects_non_uuid_non_anonymous_id() {
    let err = Caller::from_str("client-not-a-uuid").unwrap_err();
    assert!(matches!(err, ParseCallerError::InvalidId(_)));
}

#[test]
fn rejects_missing_separator() {
    assert_eq!(
        Caller::from_str("clientonly").unwrap_err(),
        ParseCallerError::MissingSeparator("clientonly".to_string())
    );
}

#[test]
fn system_caller_is_flagged() {
    assert!(Caller::system("host").is_system());
    assert!(!Caller::client("anonymous").is_system());
}
