use pwdb::session::{Response, SiteInteraction};
use pwdb::{AlphabetSpec, MasterSecret, PwdbError, Registry, SecretPrompt, Session};
use std::collections::VecDeque;
use std::fs;
use std::io;
use tempfile::tempdir;

/// Replays master password entries, failing once they run out.
struct Keyboard {
    secrets: VecDeque<&'static str>,
    asked: usize,
}

impl Keyboard {
    fn typing(secrets: &[&'static str]) -> Self {
        Self {
            secrets: secrets.iter().copied().collect(),
            asked: 0,
        }
    }
}

impl SecretPrompt for Keyboard {
    fn read_secret(&mut self, _prompt: &str) -> io::Result<MasterSecret> {
        self.asked += 1;
        self.secrets
            .pop_front()
            .map(MasterSecret::new)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
    }
}

/// Says yes to every new site and answers with a fixed spec.
struct AlwaysAdd(&'static str);

impl SiteInteraction for AlwaysAdd {
    fn confirm_add(&mut self, _site: &str) -> io::Result<bool> {
        Ok(true)
    }

    fn read_alphabet_spec(&mut self, _site: &str) -> io::Result<String> {
        Ok(self.0.to_string())
    }
}

fn password_of(response: Response) -> String {
    match response {
        Response::Password(derived) => derived.password.to_string(),
        other => panic!("Expected a password, got {:?}", other),
    }
}

#[test]
fn same_password_after_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pwdb");

    let p1 = {
        let mut setup = Keyboard::typing(&["correct-horse", "correct-horse"]);
        let mut session = Session::open(&path, &mut setup).unwrap();
        assert_eq!(setup.asked, 2, "Setup asks for the password twice");

        password_of(session.handle_input("bank", &mut AlwaysAdd("uns")).unwrap())
    };

    let mut unlock = Keyboard::typing(&["correct-horse"]);
    let mut session = Session::open(&path, &mut unlock).unwrap();
    let p2 = password_of(session.handle_input("bank", &mut AlwaysAdd("n")).unwrap());

    assert_eq!(p1, p2);
    assert_eq!(p1, "#<6D8&(DaY}U]MD2");
}

#[test]
fn wrong_password_keeps_prompting() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pwdb");
    Session::open(&path, &mut Keyboard::typing(&["correct-horse", "correct-horse"])).unwrap();

    let mut unlock = Keyboard::typing(&["wrong-horse", "wrong-horse", "correct-horse"]);
    Session::unlock(&path, &mut unlock).unwrap();
    assert_eq!(unlock.asked, 3);

    let mut only_wrong = Keyboard::typing(&["wrong-horse"; 10]);
    let err = Session::unlock(&path, &mut only_wrong).err().unwrap();
    assert!(matches!(err, PwdbError::Prompt(_)));
    assert_eq!(only_wrong.asked, 11);
}

#[test]
fn registry_round_trip_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pwdb");

    let mut session =
        Session::open(&path, &mut Keyboard::typing(&["hunter2", "hunter2"])).unwrap();
    session
        .request(
            "example.com",
            Some(AlphabetSpec::parse("un").unwrap()),
            &mut AlwaysAdd(""),
        )
        .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "f52fbd32b2b3b86f\nexample.com un\n"
    );

    let reloaded = Registry::load(&path).unwrap();
    assert_eq!(
        reloaded.lookup("example.com").map(|s| s.as_str()),
        Some("un")
    );
}

#[test]
fn duplicate_registration_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pwdb");
    Session::open(&path, &mut Keyboard::typing(&["m", "m"])).unwrap();

    let mut registry = Registry::load(&path).unwrap();
    registry
        .register("bank", AlphabetSpec::parse("uns").unwrap())
        .unwrap();
    let err = registry
        .register("bank", AlphabetSpec::parse("uns").unwrap())
        .unwrap_err();
    assert!(matches!(err, PwdbError::DuplicateSite(_)));
}

#[test]
fn errors_abort_only_the_current_request() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pwdb");
    let mut session = Session::open(&path, &mut Keyboard::typing(&["m", "m"])).unwrap();

    let err = session
        .handle_input("bank", &mut AlwaysAdd("xyz"))
        .unwrap_err();
    assert!(matches!(err, PwdbError::InvalidAlphabetSpec { .. }));

    let password = password_of(session.handle_input("bank", &mut AlwaysAdd("u")).unwrap());
    assert_eq!(password.len(), pwdb::PASSWORD_LEN);
}

#[test]
fn corrupt_registry_fails_at_startup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pwdb");
    fs::write(&path, "f52fbd32b2b3b86f\nbank\n").unwrap();

    let mut keyboard = Keyboard::typing(&["hunter2"]);
    let err = Session::open(&path, &mut keyboard).err().unwrap();
    assert!(matches!(err, PwdbError::CorruptRecord { line: 2, .. }));
    assert_eq!(keyboard.asked, 0, "No prompt before the registry parses");
}

#[test]
fn master_secret_never_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pwdb");
    let mut session = Session::open(
        &path,
        &mut Keyboard::typing(&["correct-horse", "correct-horse"]),
    )
    .unwrap();

    let password = password_of(session.handle_input("bank", &mut AlwaysAdd("uns")).unwrap());

    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains("correct-horse"));
    assert!(!content.contains(&password));
}

#[test]
fn reset_changes_every_password() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pwdb");

    let mut old = Session::open(&path, &mut Keyboard::typing(&["old", "old"])).unwrap();
    let before = password_of(old.handle_input("bank", &mut AlwaysAdd("uns")).unwrap());

    let mut new = Session::initialize(&path, &mut Keyboard::typing(&["new", "new"])).unwrap();
    assert!(new.registry().lookup("bank").is_none());
    let after = password_of(new.handle_input("bank", &mut AlwaysAdd("uns")).unwrap());

    assert_ne!(before, after);
}
