//! # Headless Sync Client
//!
//! Connects to a relay server and runs the sync loop against a stand-in game.
//! Useful for exercising a server without a console.
//!
//! ## Usage
//!
//! ```bash
//! odyssey_client --config odyssey.toml --save progress.toml --duration 60
//! ```

use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use odyssey_networking::{
    Client, ClientConfig, FramePacer, HeadlessHost, NetResult, PlayerId, PlayerSample, Quat,
    SaveData, StageSample, TcpTransport,
};

struct Args {
    config: Option<PathBuf>,
    save: Option<PathBuf>,
    duration_secs: Option<u64>,
    name: Option<String>,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config: None,
        save: None,
        duration_secs: None,
        name: None,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--config" | "-c" => {
                parsed.config = value.map(PathBuf::from);
                i += 1;
            }
            "--save" | "-s" => {
                parsed.save = value.map(PathBuf::from);
                i += 1;
            }
            "--duration" | "-d" => {
                parsed.duration_secs = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--name" | "-n" => {
                parsed.name = value.cloned();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: odyssey_client [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>      TOML client config (default: built-in)");
                println!("  -s, --save <PATH>        Progress file, loaded at start and stored on exit");
                println!("  -n, --name <NAME>        Name announced to other players");
                println!("  -d, --duration <SECS>    Run for N seconds then exit");
                println!("  -h, --help               Show this help");
                return None;
            }
            other => eprintln!("ignoring unknown argument {other}"),
        }
        i += 1;
    }
    Some(parsed)
}

fn session_id() -> PlayerId {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    PlayerId::from_u128((u128::from(std::process::id()) << 96) ^ nanos)
}

fn main() -> NetResult<()> {
    let Some(args) = parse_args() else {
        return Ok(());
    };

    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(name) = args.name {
        config.client_name = name;
    }

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         ODYSSEY HEADLESS CLIENT                                  ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("Server:    {}:{}", config.effective_ip(), config.effective_port());
    println!("Name:      {}", config.client_name);
    println!("UDP:       {}", config.udp_enabled);
    println!("Tick rate: {} Hz", config.tick_rate);
    println!();

    let transport = TcpTransport::new(config.udp_enabled);
    let tick_rate = config.tick_rate;
    let mut client = Client::new(config, session_id(), transport)?;

    if let Some(path) = args.save.as_ref().filter(|p| p.exists()) {
        let save = SaveData::load(path)?;
        client.restore(&save);
        println!("Loaded progress from {}", path.display());
    }

    let mut host = HeadlessHost::new();
    host.player = Some(PlayerSample {
        rotation: Quat::IDENTITY,
        act_name: "Wait".to_owned(),
        ..PlayerSample::default()
    });
    host.stage = Some(StageSample {
        stage: "CapWorldHomeStage".to_owned(),
        scenario: 1,
        is_2d: false,
    });

    client.spawn_read_thread()?;
    let mut pacer = FramePacer::new(tick_rate);
    let start = Instant::now();
    let stats_period = u64::from(tick_rate) * 5;
    let reconnect_period = u64::from(tick_rate);

    loop {
        if let Some(duration) = args.duration_secs {
            if start.elapsed().as_secs() >= duration {
                break;
            }
        }

        pacer.wait();
        client.update(&mut host);

        if pacer.every(reconnect_period) && client.is_read_thread_finished() {
            client.restart()?;
        }

        for event in host.take_events() {
            println!("game: {event:?}");
        }

        if pacer.every(stats_period) {
            let (sent, deduped) =
                client.with_outbound(|cache, _| (cache.sent_count(), cache.suppressed_count()));
            let state = client.state();
            println!(
                "[{}] frame {} | skipped {} | sent {} | deduped {} | players {} | shines {}",
                client.connection_state(),
                pacer.frames(),
                pacer.skipped(),
                sent,
                deduped,
                state.puppets.connect_count(),
                state.ledger.shine_count(),
            );
        }
    }

    client.close();
    if let Some(path) = &args.save {
        client.save_data().store(path)?;
        println!("Stored progress to {}", path.display());
    }
    Ok(())
}
