use clap::Subcommand;
use focusdeck_core::storage::Database;
use focusdeck_core::{shop_badge, Redemption, BADGE_SHOP};

const HISTORY_LIMIT: usize = 20;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// List badges that can be bought with points
    Shop,
    /// Spend points on a shop badge
    Redeem { id: String },
}

pub fn run(history: bool, action: Option<ProgressAction>) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        None => summary(&db, history),
        Some(ProgressAction::Shop) => {
            let progress = db.progress()?;
            let items: Vec<_> = BADGE_SHOP
                .iter()
                .map(|badge| {
                    serde_json::json!({
                        "id": badge.id,
                        "name": badge.name,
                        "cost": badge.cost,
                        "owned": progress.has_badge(badge.id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
            Ok(())
        }
        Some(ProgressAction::Redeem { id }) => {
            let badge = shop_badge(&id).ok_or_else(|| format!("unknown badge: {id}"))?;
            match db.redeem_badge(badge)? {
                Redemption::Redeemed { balance } => {
                    let out = serde_json::json!({ "redeemed": badge.id, "points": balance });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                    Ok(())
                }
                Redemption::AlreadyOwned => Err("Already owned".into()),
                Redemption::NotEnoughPoints { need, have } => {
                    Err(format!("Not enough points! Need {need}, have {have}").into())
                }
            }
        }
    }
}

fn summary(db: &Database, history: bool) -> Result<(), Box<dyn std::error::Error>> {
    let progress = db.progress()?;
    let mut out = serde_json::json!({
        "points": progress.points,
        "rank": progress.rank().name(),
        "badges": progress.badges,
    });
    if history {
        out["history"] = serde_json::to_value(db.point_log(HISTORY_LIMIT)?)?;
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
