use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pow-ledger")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "createwallet", about = "Create a new wallet and print its keys")]
    Createwallet,
    #[command(name = "validateaddress", about = "Check an address's version and checksum")]
    ValidateAddress {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(
        name = "sign",
        about = "Sign a transfer with existing keys and print the submission request"
    )]
    Sign {
        #[arg(long = "private-key", help = "Sender private key (hex)")]
        private_key: String,
        #[arg(long = "public-key", help = "Sender public key (hex)")]
        public_key: String,
        #[arg(long = "to", help = "Recipient address")]
        recipient: String,
        #[arg(help = "Amount to send")]
        amount: f64,
    },
    #[command(
        name = "demo",
        about = "Run one signed transfer through a fresh ledger and print the chain"
    )]
    Demo {
        #[arg(long = "amount", default_value_t = 1.0, help = "Amount to transfer")]
        amount: f64,
    },
    #[command(name = "startnode", about = "Start the ledger with background mining")]
    StartNode {
        #[arg(long = "miner", help = "Address that receives mining rewards")]
        miner: Option<String>,
        #[arg(long = "config", help = "TOML settings file")]
        config: Option<String>,
        #[arg(
            long = "duration",
            help = "Stop after this many seconds instead of running forever"
        )]
        duration: Option<u64>,
        #[arg(long = "demo", help = "Submit a signed demo transfer after startup")]
        demo: bool,
    },
}
