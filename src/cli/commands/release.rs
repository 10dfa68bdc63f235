use crate::config::Config;
use crate::error::Result;
use crate::session::{SessionCache, SessionManager};

pub async fn execute() -> Result<()> {
    let config = Config::load()?;
    let session =
        SessionManager::with_cache(&config.identity.default_profile, SessionCache::new()?)?;

    let was_active = session.session_info().active;
    session.end_session();

    if was_active {
        println!("✓ Session released");
    } else {
        println!("No active session");
    }
    println!("Current identity: {}", session.current_identity().describe());

    Ok(())
}
