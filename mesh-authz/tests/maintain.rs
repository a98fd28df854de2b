use mesh_authz::{
    error,
    model::{Group, Module, Operation, Principal, User},
    AcquireContext, AuthChecker, AuthConfig, MemoryDirectory,
};

struct Fixture {
    checker: AuthChecker<MemoryDirectory>,
    owner: String,
    sub: String,
    group: String,
}

fn fixture() -> Fixture {
    let config = AuthConfig::default();
    let codec = config.codec();
    let owner = codec.encode(&Principal::User("u0".to_string())).unwrap();
    let sub = codec.encode(&Principal::User("u1".to_string())).unwrap();
    let group = codec.encode(&Principal::Group("g1".to_string())).unwrap();

    let directory = MemoryDirectory::new();
    directory.add_user(User::owner("u0", &owner));
    directory.add_user(User::sub_account("u1", "u0", &sub));
    directory.add_group(Group::new("g1", "u0", &group));
    directory.refresh();

    Fixture {
        checker: AuthChecker::new(directory, config),
        owner,
        sub,
        group,
    }
}

fn maintain(token: &str, operation: Operation) -> AcquireContext {
    AcquireContext::new(token, Module::Maintain, operation)
}

fn not_allowed(result: Result<(), error::Auth>) -> bool {
    matches!(result, Err(error::Auth::NotAllowedAccess(_)))
}

#[test]
fn only_owners_run_maintenance() {
    let f = fixture();

    assert_eq!(
        f.checker
            .check_console_permission(&mut maintain(&f.owner, Operation::Write)),
        Ok(())
    );
    assert!(not_allowed(
        f.checker
            .check_console_permission(&mut maintain(&f.sub, Operation::Write))
    ));
    assert!(not_allowed(
        f.checker
            .check_console_permission(&mut maintain(&f.group, Operation::Delete))
    ));
    // anonymous operators hold no user token
    assert!(not_allowed(
        f.checker
            .check_console_permission(&mut maintain("", Operation::Write))
    ));
}

#[test]
fn reads_only_need_verification() {
    let f = fixture();

    for token in [&f.owner, &f.sub, &f.group] {
        assert_eq!(
            f.checker
                .check_console_permission(&mut maintain(token, Operation::Read)),
            Ok(())
        );
    }
}

#[test]
fn disabled_owner_cannot_maintain() {
    let f = fixture();
    f.checker.directory().enable_user_token("u0", false);
    f.checker.directory().refresh();

    assert!(not_allowed(
        f.checker
            .check_console_permission(&mut maintain(&f.owner, Operation::Write))
    ));
    assert_eq!(
        f.checker
            .check_console_permission(&mut maintain(&f.owner, Operation::Read)),
        Ok(())
    );
}

#[test]
fn maintenance_ignores_policies_on_the_client_channel() {
    let f = fixture();
    let mut config = AuthConfig::default();
    config.client_open = true;
    f.checker.reload(config);

    // the client channel has no maintenance rule, the sub-account goes
    // through policy evaluation and an empty resource set passes
    let mut ctx = maintain(&f.sub, Operation::Write);
    assert_eq!(f.checker.check_client_permission(&mut ctx), Ok(()));
}
