//! Local walkthrough host for the session core.
//!
//! Boots a `SessionCore` over a filesystem role cache, replays a scripted
//! sign-in, and prints every redirect and event. Guarded by the `host`
//! feature; real clients embed the library instead.

use anyhow::{Context, Result};
use async_lock::RwLock;
use async_trait::async_trait;
use clap::Parser;
use hestia_app::{
    apply_snapshot, probe_role_existence, switch_to, Navigator, RecordKind, RecordProbe, SessionBridge,
    SessionConfig, SessionCore, SessionDeps, SessionSnapshot, SwitchOffer,
};
use hestia_core::{HestiaError, Identity, IdentityId, LocationGroup, Profile, Role, RoleClaim};
use hestia_effects::FilesystemStorageHandler;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Replay a sign-in against the session core
#[derive(Debug, Parser)]
#[command(name = "session-host", version)]
struct Args {
    /// Session config file (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the role cache
    #[arg(short, long, default_value = "./hestia-data")]
    data_dir: PathBuf,

    /// Role stored on the server profile; omit to simulate a missing profile
    #[arg(short, long)]
    profile_role: Option<String>,

    /// Route shown when the app starts
    #[arg(short, long, default_value = "/(auth)/login")]
    location: String,

    /// Switch to this role after sign-in
    #[arg(short, long)]
    switch_to: Option<Role>,
}

/// Navigator that lands on every redirect immediately.
struct ConsoleNavigator {
    route: Mutex<String>,
}

impl Navigator for ConsoleNavigator {
    fn current_location_group(&self) -> LocationGroup {
        self.route
            .lock()
            .map(|route| LocationGroup::of_route(&route))
            .unwrap_or_default()
    }

    fn redirect_to(&self, route: &str) {
        println!("  navigate -> {route}");
        if let Ok(mut current) = self.route.lock() {
            *current = route.to_string();
        }
    }
}

/// Session source that accepts every switch.
struct ScriptedSession;

#[async_trait]
impl SessionBridge for ScriptedSession {
    async fn switch_active_role(&self, target: Role) -> Result<(), HestiaError> {
        println!("  server: active role set to {target}");
        Ok(())
    }
}

/// Ownership follows the profile role given on the command line.
struct ScriptedRecords {
    owns: Option<Role>,
}

#[async_trait]
impl RecordProbe for ScriptedRecords {
    async fn has_record_owned_by(
        &self,
        _identity: &IdentityId,
        kind: RecordKind,
    ) -> Result<bool, HestiaError> {
        Ok(self.owns.is_some_and(|role| RecordKind::for_role(role) == kind))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn profile_for(claim: &str) -> Profile {
    let mut profile = Profile::new("profile-1", Role::DEFAULT, "Local User");
    profile.role = RoleClaim::parse(claim);
    profile
}

async fn report(core: &Arc<RwLock<SessionCore>>, step: &str) {
    let core = core.read().await;
    println!(
        "[{step}] phase={} guard={:?} view={:?} cached={:?}",
        core.phase(),
        core.guard_state(),
        core.view(),
        core.cached_role()
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let storage = FilesystemStorageHandler::new(&args.data_dir)
        .with_context(|| format!("opening {}", args.data_dir.display()))?;
    let navigator = Arc::new(ConsoleNavigator {
        route: Mutex::new(args.location.clone()),
    });
    let owns = args
        .profile_role
        .as_deref()
        .and_then(|claim| RoleClaim::parse(claim).valid());

    let deps = SessionDeps {
        session: Arc::new(ScriptedSession),
        probe: Arc::new(ScriptedRecords { owns }),
        navigator,
        storage: Arc::new(storage),
    };
    let core = Arc::new(RwLock::new(SessionCore::bootstrap(config, deps).await?));
    let mut events = core.read().await.subscribe();

    let identity = Identity::new(IdentityId::new_random()).with_email("local@hestia.test");

    apply_snapshot(&core, SessionSnapshot::loading()).await;
    report(&core, "boot").await;

    apply_snapshot(&core, SessionSnapshot::fetching(identity.clone())).await;
    report(&core, "signed in").await;

    let snapshot = match args.profile_role.as_deref() {
        Some(claim) => SessionSnapshot::resolved(identity.clone(), profile_for(claim)),
        None => SessionSnapshot::without_profile(identity.clone()),
    };
    apply_snapshot(&core, snapshot).await;
    report(&core, "profile").await;

    let flags = probe_role_existence(&core).await?;
    for role in Role::all() {
        println!("  switcher: {}", SwitchOffer::for_target(*role, flags).label());
    }

    if let Some(target) = args.switch_to {
        let outcome = switch_to(&core, target).await?;
        println!("  switch: {outcome:?}");
        let confirmed = SessionSnapshot::resolved(
            identity,
            Profile::new("profile-1", target, "Local User"),
        );
        apply_snapshot(&core, confirmed).await;
        report(&core, "switched").await;
    }

    while let Ok(event) = events.try_recv() {
        println!("  event: {event:?}");
    }
    Ok(())
}
