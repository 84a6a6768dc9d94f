//! Donation logger
//!
//! Follows one streamer's chat and logs balloons, ad-balloons,
//! subscriptions and missions. Reconnects automatically until the
//! broadcast ends or Ctrl-C is pressed.
//!
//! Run with: cargo run --example balloon_logger STREAMER_ID [CHANNEL_PASSWORD]
//!
//! Set `RUST_LOG=soop_chat=debug` for connection-level detail.

use std::sync::Arc;

use soop_chat::{
    Adballoon, Balloon, ChatHandler, ClientConfig, ConnectionState, Error, HttpResolver, Mission,
    Subscription, Supervisor,
};

/// Handler that logs donations and keeps running totals
#[derive(Default)]
struct DonationLogger {
    balloons: u64,
    adballoons: u64,
    subscriptions: u64,
}

impl DonationLogger {
    fn print_totals(&self) {
        println!(
            "Totals: balloons={} adballoons={} subscriptions={}",
            self.balloons, self.adballoons, self.subscriptions
        );
    }
}

impl ChatHandler for DonationLogger {
    fn on_state_change(&mut self, state: ConnectionState) {
        tracing::debug!(state = %state, "Connection state");
        if state == ConnectionState::Closed {
            self.print_totals();
        }
    }

    fn on_join_channel(&mut self, joined: bool) {
        if joined {
            println!("Joined chat");
        } else {
            println!("Join rejected (wrong channel password?)");
        }
    }

    fn on_balloon(&mut self, balloon: Balloon) {
        self.balloons += u64::from(balloon.count);
        println!(
            "[balloon] {} ({}) x{}",
            balloon.user.name, balloon.user.id, balloon.count
        );
    }

    fn on_adballoon(&mut self, adballoon: Adballoon) {
        self.adballoons += u64::from(adballoon.count);
        println!(
            "[adballoon] {} ({}) x{}",
            adballoon.user.name, adballoon.user.id, adballoon.count
        );
    }

    fn on_subscription(&mut self, subscription: Subscription) {
        self.subscriptions += 1;
        println!(
            "[subscription] {} ({}) month {}",
            subscription.user.name, subscription.user.id, subscription.count
        );
    }

    fn on_mission(&mut self, mission: Mission) {
        println!(
            "[mission] {} ({}) \"{}\" x{}",
            mission.user.name, mission.user.id, mission.title, mission.count
        );
    }

    fn on_admin_notice(&mut self, notice: String) {
        println!("[notice] {}", notice);
    }

    fn on_error(&mut self, error: &Error) {
        tracing::warn!(error = %error, "Chat error");
    }
}

fn print_usage() {
    eprintln!("Usage: balloon_logger STREAMER_ID [CHANNEL_PASSWORD]");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let Some(streamer_id) = args.get(1) else {
        print_usage();
        std::process::exit(1);
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("soop_chat=info".parse()?)
                .add_directive("balloon_logger=debug".parse()?),
        )
        .init();

    let mut config = ClientConfig::new(streamer_id.as_str());
    if let Some(password) = args.get(2) {
        config = config.channel_password(password.as_str());
    }

    let resolver = Arc::new(HttpResolver::new()?);
    let supervisor = Supervisor::new(config, resolver, DonationLogger::default());
    let handle = supervisor.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Stopping...");
            handle.stop();
        }
    });

    println!("Following chat for {}", streamer_id);
    supervisor.run().await?;

    Ok(())
}
