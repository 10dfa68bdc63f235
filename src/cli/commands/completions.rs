use crate::cli::{Cli, Shell};
use clap::CommandFactory;
use clap_complete::{generate, Shell as ClapShell};
use std::io;

pub fn execute(shell: Shell) {
    let clap_shell = match shell {
        Shell::Bash => ClapShell::Bash,
        Shell::Zsh => ClapShell::Zsh,
        Shell::Fish => ClapShell::Fish,
        Shell::PowerShell => ClapShell::PowerShell,
        Shell::Elvish => ClapShell::Elvish,
    };

    let mut cmd = Cli::command();
    generate(clap_shell, &mut cmd, "rolekeeper", &mut io::stdout());

    eprintln!("# Load in the current shell, e.g. for bash:");
    eprintln!("#   eval \"$(rolekeeper completions bash)\"");
    eprintln!("# Or save the script to your shell's completion directory.");
}
