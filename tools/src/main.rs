//! session-runner: headless session driver for Wayfarer.
//!
//! Usage:
//!   session-runner --seed 12345 --actions 500 --db saves.db
//!   session-runner --data-dir ./data --ipc-mode

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};
use wayfarer_core::{
    actions::{GameAction, GameContext},
    character::{Character, Location},
    config::GameData,
    delta::Delta,
    inventory::{EquipmentSlot, ItemStack, SlotRef, GENERAL_SLOTS},
    items::GOLD_ITEM,
    merchant::MerchantRegistry,
    session::{GameSession, SessionRegistry},
    snapshot::Snapshot,
    store::GameStore,
};

const PLAYER: &str = "runner";

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum IpcCommand {
    Control(Control),
    Action(GameAction),
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Control {
    GetState,
    Quit,
}

#[derive(serde::Serialize)]
struct IpcReply<'a> {
    success: bool,
    message: String,
    color:   String,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta:   Option<Delta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state:   Option<&'a Snapshot>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let actions = parse_arg(&args, "--actions", 200u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str());
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("Wayfarer: session-runner");
        println!("  seed:      {seed}");
        println!("  actions:   {actions}");
        println!("  db:        {}", db.unwrap_or("(none)"));
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let data = GameData::load(data_dir)?;
    let store = match db {
        Some(path) => {
            let store = GameStore::open(path)?;
            store.migrate()?;
            store.seed_from(&data)?;
            Some(store)
        }
        None => None,
    };

    let merchants = MerchantRegistry::new();
    let ctx = GameContext::new(&data).with_merchants(&merchants);
    let sessions = SessionRegistry::new();

    let save_id = format!("seed-{seed}");
    let character = match store.as_ref() {
        Some(s) => s.load_character(PLAYER, &save_id)?,
        None => None,
    }
    .unwrap_or_else(new_character);

    let shared = sessions.open(&ctx, PLAYER, &save_id, character)?;
    {
        let mut session = shared
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        if ipc_mode {
            run_ipc_loop(&ctx, &mut session)?;
        } else {
            let stats = run_soak(&ctx, &mut session, seed, actions);
            print_summary(&session, &stats);
        }
        if let Some(s) = store.as_ref() {
            s.save_character(PLAYER, &save_id, &session.character)?;
            log::info!("saved {PLAYER}/{save_id}");
        }
    }
    sessions.unload(PLAYER, &save_id)?;
    merchants.cleanup_player(PLAYER);

    Ok(())
}

fn new_character() -> Character {
    let mut character = Character::new(
        "Wayfarer",
        Location { city: "kingdom".into(), district: "center".into(), building: String::new() },
    );
    character.inventory.general_slots[0] = Some(ItemStack {
        item:     GOLD_ITEM.into(),
        quantity: 100,
    });
    character
}

// ── IPC ──────────────────────────────────────────────────────────────────────

fn run_ipc_loop(ctx: &GameContext<'_>, session: &mut GameSession) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "success": false, "message": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Control(Control::Quit) => break,
            IpcCommand::Control(Control::GetState) => IpcReply {
                success: true,
                message: String::new(),
                color:   String::new(),
                delta:   None,
                state:   Some(session.snapshot()),
            },
            IpcCommand::Action(action) => match session.perform(ctx, &action) {
                Ok((outcome, delta)) => IpcReply {
                    success: true,
                    message: outcome.message,
                    color:   outcome.color,
                    delta:   Some(delta),
                    state:   None,
                },
                Err(e) => IpcReply {
                    success: false,
                    message: e.to_string(),
                    color:   "red".into(),
                    delta:   None,
                    state:   None,
                },
            },
        };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

// ── Soak ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SoakStats {
    performed: u64,
    rejected:  u64,
    by_action: BTreeMap<&'static str, u64>,
    deltas:    u64,
}

fn run_soak(ctx: &GameContext<'_>, session: &mut GameSession, seed: u64, actions: u64) -> SoakStats {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut stats = SoakStats::default();

    for _ in 0..actions {
        let action = random_action(&mut rng);
        *stats.by_action.entry(action.name()).or_insert(0) += 1;
        match session.perform(ctx, &action) {
            Ok((_, delta)) => {
                stats.performed += 1;
                if !delta.is_empty() {
                    stats.deltas += 1;
                }
            }
            Err(e) => {
                stats.rejected += 1;
                log::debug!("{} rejected: {e}", action.name());
            }
        }
    }
    stats
}

fn random_slot(rng: &mut Pcg64) -> SlotRef {
    if rng.gen_bool(0.7) {
        SlotRef::General(rng.gen_range(0..GENERAL_SLOTS))
    } else {
        SlotRef::Backpack(rng.gen_range(0..4))
    }
}

fn random_action(rng: &mut Pcg64) -> GameAction {
    const ITEMS: [&str; 6] = ["bread", "iron-ingot", "backpack", "dagger", "health-potion", "strength-draught"];
    const DISTRICTS: [&str; 2] = ["center", "market"];
    const BUILDINGS: [&str; 5] = ["general-store", "tavern", "temple", "smithy", "bank"];

    match rng.gen_range(0..21) {
        0 | 1 => GameAction::Wait { minutes: rng.gen_range(15..=360) },
        2 => GameAction::AdvanceTime { minutes: rng.gen_range(1..=120) },
        3 => GameAction::PickUp {
            item_id:  ITEMS[rng.gen_range(0..ITEMS.len())].into(),
            quantity: rng.gen_range(1..=3),
        },
        4 => GameAction::Drop { slot: random_slot(rng), quantity: 0 },
        5 => GameAction::UseItem { slot: random_slot(rng) },
        6 => GameAction::Equip { slot: random_slot(rng) },
        7 => GameAction::Unequip {
            slot: EquipmentSlot::ALL[rng.gen_range(0..EquipmentSlot::ALL.len())],
        },
        8 => GameAction::MoveItem { from: random_slot(rng), to: random_slot(rng) },
        9 => GameAction::Move { district: DISTRICTS[rng.gen_range(0..DISTRICTS.len())].into() },
        10 => GameAction::EnterBuilding {
            building_id: BUILDINGS[rng.gen_range(0..BUILDINGS.len())].into(),
        },
        11 => GameAction::ExitBuilding,
        12 => GameAction::Buy {
            npc_id:   "garrick".into(),
            item_id:  ITEMS[rng.gen_range(0..ITEMS.len())].into(),
            quantity: 1,
        },
        13 => GameAction::RentRoom,
        14 => GameAction::Rest,
        15 => GameAction::SplitItem { from: random_slot(rng), to: random_slot(rng), quantity: 1 },
        16 => GameAction::StackItem { from: random_slot(rng), to: random_slot(rng) },
        17 => GameAction::RegisterVault,
        18 => GameAction::VaultDeposit { slot: random_slot(rng), quantity: 0 },
        19 => GameAction::VaultWithdraw { vault_slot: rng.gen_range(0..4), quantity: 0 },
        _ => GameAction::Sleep,
    }
}

fn print_summary(session: &GameSession, stats: &SoakStats) {
    let snap = session.snapshot();
    println!("=== Summary ===");
    println!("  performed:     {}", stats.performed);
    println!("  rejected:      {}", stats.rejected);
    println!("  non-empty Δ:   {}", stats.deltas);
    println!("  day / time:    {} / {:02}:{:02}", snap.current_day, snap.time_of_day / 60, snap.time_of_day % 60);
    println!("  hp:            {}/{}", snap.hp, snap.max_hp);
    println!("  fatigue:       {}", snap.fatigue);
    println!("  hunger:        {}", snap.hunger);
    println!("  gold:          {}", snap.gold);
    println!("  location:      {}/{}/{}", snap.city, snap.district, snap.building);
    println!("  effects:       {}", snap.effects.iter().map(|e| e.effect.effect_id.as_str()).collect::<Vec<_>>().join(", "));
    println!();
    println!("  actions:");
    for (name, count) in &stats.by_action {
        println!("    {name:<16} {count}");
    }
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
