// This is my main entry point for the ledger CLI application
// Everything here drives the library; the ledger itself lives only in memory
use clap::Parser;
use log::{error, info, LevelFilter};
use pow_ledger::{
    validate_address, AmountResponse, Blockchain, Command, MiningOutcome, MiningScheduler, Opt,
    Settings, TransactionRequest, Wallet, GLOBAL_CONFIG,
};
use std::path::Path;
use std::process;
use std::thread;
use std::time::Duration;

fn main() {
    // Info level shows mining rounds and rejected transactions without flooding the terminal
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        // When I want a new identity: keys plus the address derived from them
        Command::Createwallet => {
            let wallet = Wallet::new()?;
            println!("{}", serde_json::to_string_pretty(&wallet)?);
        }
        Command::ValidateAddress { address } => {
            if validate_address(&address) {
                println!("{address} is valid");
            } else {
                return Err(format!("Invalid address: {address}").into());
            }
        }
        // When someone hands me their keys and wants a ready-to-submit request
        Command::Sign {
            private_key,
            public_key,
            recipient,
            amount,
        } => {
            let wallet = Wallet::from_key_hex(&private_key, &public_key)?;
            let signed = wallet.sign_transaction(&recipient, amount)?;
            let request = TransactionRequest::from_signed(&signed);
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        // One transfer end to end, mined synchronously
        Command::Demo { amount } => {
            let miner = Wallet::new()?;
            let blockchain = Blockchain::with_settings(miner.get_address(), Settings::from_environment()?)?;
            let (sender, recipient) = submit_demo_transfer(&blockchain, amount)?;

            match blockchain.mine()? {
                MiningOutcome::Sealed(block) => println!("Sealed block {}", block.hash_hex()),
                other => return Err(format!("Mining did not seal a block: {other:?}").into()),
            }
            println!("{}", blockchain.get_snapshot());
            print_balance(&blockchain, "sender", sender.get_address())?;
            print_balance(&blockchain, "recipient", recipient.get_address())?;
            print_balance(&blockchain, "miner", miner.get_address())?;
        }
        // When I want a long-running ledger that mines on a timer
        Command::StartNode {
            miner,
            config,
            duration,
            demo,
        } => {
            let settings = match config {
                Some(path) => Settings::load(Path::new(&path))?.with_env_overrides()?,
                None => Settings::from_environment()?,
            };

            if let Some(addr) = miner {
                GLOBAL_CONFIG.set_mining_addr(addr);
            }
            let miner_address = match GLOBAL_CONFIG.get_mining_addr() {
                Some(addr) => addr,
                None => {
                    let wallet = Wallet::new()?;
                    println!("No miner address given, generated wallet:");
                    println!("{}", serde_json::to_string_pretty(&wallet)?);
                    wallet.get_address().to_string()
                }
            };
            if !validate_address(&miner_address) {
                return Err(format!("Invalid miner address: {miner_address}").into());
            }
            println!("Mining is on. Address to receive rewards: {miner_address}");

            let blockchain = Blockchain::with_settings(&miner_address, settings)?;
            let interval = blockchain.get_settings().mining_interval();
            let scheduler = MiningScheduler::start(blockchain.clone(), interval)?;

            if demo {
                submit_demo_transfer(&blockchain, 1.0)?;
            }

            match duration {
                Some(secs) => thread::sleep(Duration::from_secs(secs)),
                None => loop {
                    thread::park();
                },
            }

            scheduler.stop();
            println!("{}", blockchain.get_snapshot());
        }
    }
    Ok(())
}

// I sign with a fresh wallet and push the request through the same boundary an
// outside caller would use
fn submit_demo_transfer(
    blockchain: &Blockchain,
    amount: f64,
) -> Result<(Wallet, Wallet), Box<dyn std::error::Error>> {
    let sender = Wallet::new()?;
    let recipient = Wallet::new()?;
    let signed = sender.sign_transaction(recipient.get_address(), amount)?;
    blockchain.create_transaction(&TransactionRequest::from_signed(&signed))?;
    info!(
        "Submitted demo transfer of {amount} from {} to {}",
        sender.get_address(),
        recipient.get_address()
    );
    Ok((sender, recipient))
}

fn print_balance(
    blockchain: &Blockchain,
    label: &str,
    address: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = AmountResponse {
        amount: blockchain.calculate_total_amount(address),
    };
    println!("{label} {address}: {}", serde_json::to_string(&response)?);
    Ok(())
}
