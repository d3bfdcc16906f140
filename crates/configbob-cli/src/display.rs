//! Display formatting for CLI output
//!
//! The build transcript goes to stdout: a banner, one block per source
//! tree and the written folders and files.

use configbob_core::data::display_paths;
use configbob_core::{BuildResult, WriteSummary};
use configbob_engine::{FileAction, TreeReport};
use console::style;
use std::path::{Path, PathBuf};

const LINE: &str = "-------------------------------------------------------------------------------";

/// Print a section header between two rules
pub fn section(title: &str) {
    println!("{}", style(LINE).dim());
    println!("{}", style(title).cyan().bold());
    println!("{}", style(LINE).dim());
}

/// Print what is about to be built
pub fn build_banner(data_files: &[PathBuf], source_dirs: &[PathBuf]) {
    section("building");
    println!("data files     : {}", display_paths(data_files));
    println!("source folders : {}", display_paths(source_dirs));
}

/// Print the per-file account of one source tree
pub fn tree_report(report: &TreeReport) {
    section(&format!("processed folder {}", report.root.display()));

    for (relative, action) in &report.actions {
        let label = match action {
            FileAction::Rendered => style("rendered").green(),
            FileAction::Copied => style("copied  ").blue(),
        };
        println!("  {} {}", label, relative);
    }

    println!(
        "  {} rendered, {} copied",
        style(report.rendered()).bold(),
        style(report.copied()).bold()
    );
}

/// Print the folders and files a write produced
pub fn write_summary(summary: &WriteSummary) {
    section("building folder structure:");
    for (i, folder) in summary.folders.iter().enumerate() {
        println!("{} {}", i + 1, folder.display());
    }

    section("writing files:");
    for (i, file) in summary.files.iter().enumerate() {
        println!(
            "{} {} {}",
            style(format_mode(file.permissions)).dim(),
            i + 1,
            file.path.display()
        );
    }

    println!(
        "{} {} folder(s), {} file(s)",
        style("✓").green().bold(),
        summary.folders.len(),
        summary.files.len()
    );
}

/// Print what a write would produce, without touching the disk
pub fn dry_run(output: Option<&Path>, result: &BuildResult) {
    let root = output.unwrap_or_else(|| Path::new("."));

    section("dry run, nothing written:");
    for folder in &result.folders {
        println!("  {}/", root.join(folder).display());
    }
    for (relative, file) in &result.files {
        println!(
            "  {} {} ({} bytes)",
            style(format_mode(file.permissions)).dim(),
            root.join(relative).display(),
            file.data.len()
        );
    }
}

/// Format permission bits the way `ls -l` shows a regular file
pub fn format_mode(mode: u32) -> String {
    let mut out = String::with_capacity(10);
    out.push('-');
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}
