use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

// Use library instead of local modules
use creci_atlas::{
    export_consolidated_csv, filter_by_minimums, hash_password, load_table_or_empty, top_cities,
    AtlasConfig, CachedGazetteerLoader, ConsolidationReport, Consolidator, FuzzyMatcher,
    SummaryStats, UserStore,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("report") | None => run_report(None),
        Some("export") => {
            let path = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("consolidado.csv"));
            run_report(Some(path))
        }
        Some("hash-password") => run_hash_password(&args),
        Some("adduser") => run_add_user(&args),
        Some("users") => run_list_users(),
        Some(other) => {
            eprintln!("unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: creci-atlas [report | export [FILE] | users | adduser USER PASS NAME [ROLE] | hash-password PASS]");
}

fn run_report(export_path: Option<PathBuf>) -> Result<()> {
    let config = AtlasConfig::from_env();

    println!("🗺️  CRECI Atlas - Consolidated Registry Report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Gazetteer
    println!("\n📂 Loading gazetteer...");
    let mut loader = CachedGazetteerLoader::new(config.region_code);
    let gazetteer = loader
        .load(&config.gazetteer_path)
        .with_context(|| format!("cannot load gazetteer {}", config.gazetteer_path.display()))?;
    println!(
        "✓ {} municipalities loaded for region {}",
        gazetteer.len(),
        config.region_code
    );

    // 2. Sources (each one degrades to empty on failure)
    println!("\n📊 Loading source tables...");
    let brokers = load_table_or_empty(&config.brokers_path, &config.region, "Corretores");
    let agencies = load_table_or_empty(&config.agencies_path, &config.region, "Imobiliárias");
    println!(
        "✓ {} broker cities, {} agency cities after normalization",
        brokers.len(),
        agencies.len()
    );

    if brokers.is_empty() && agencies.is_empty() {
        bail!("insufficient data: both sources are empty after normalization");
    }

    // 3. Consolidate
    println!("\n🔄 Consolidating...");
    let consolidator =
        Consolidator::with_matcher(FuzzyMatcher::with_threshold(config.fuzzy_threshold));
    let report = consolidator.consolidate(&gazetteer, &brokers, &agencies);
    println!("✓ {}", report.summary());

    print_report(&report);

    if let Some(path) = export_path {
        export_consolidated_csv(&path, &report.records)?;
        println!("\n💾 Exported {} records to {}", report.records.len(), path.display());
    }

    Ok(())
}

fn print_report(report: &ConsolidationReport) {
    let stats = SummaryStats::from_records(&report.records);

    println!("\n📊 Indicators");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🏙️  Cities mapped:       {}", stats.city_count);
    println!("👥 Total professionals: {}", stats.grand_total);
    println!(
        "👤 Brokers:             {} ({} compliant / {} noncompliant)",
        stats.brokers_total, stats.brokers_compliant, stats.brokers_noncompliant
    );
    println!(
        "🏢 Agencies:            {} ({} compliant / {} noncompliant)",
        stats.agencies_total, stats.agencies_compliant, stats.agencies_noncompliant
    );
    println!("📈 Mean per city:       {:.1}", stats.mean_per_city);

    // Data-quality warnings the dashboard surfaces in its sidebar
    if report.unmatched_count() > 0 {
        println!("\n⚠️  Unreconciled cities:");
        for city in &report.unmatched_brokers {
            println!("   corretores: {}", city);
        }
        for city in &report.unmatched_agencies {
            println!("   imobiliárias: {}", city);
        }
    }

    // Cities with at least one professional, largest first
    let active = filter_by_minimums(&report.records, 0, 0);
    println!("\n🏆 Top 10 cities");
    for record in top_cities(&active, 10) {
        println!(
            "   {:<30} 👤 {:<5} 🏢 {:<5} = {}",
            record.city, record.brokers_total, record.agencies_total, record.grand_total
        );
    }
}

fn run_hash_password(args: &[String]) -> Result<()> {
    let Some(password) = args.get(2) else {
        bail!("usage: creci-atlas hash-password PASSWORD");
    };

    println!("{}", hash_password(password));

    Ok(())
}

fn run_add_user(args: &[String]) -> Result<()> {
    let (Some(username), Some(password), Some(full_name)) =
        (args.get(2), args.get(3), args.get(4))
    else {
        bail!("usage: creci-atlas adduser USERNAME PASSWORD FULL_NAME [ROLE]");
    };
    let role = args.get(5).map(String::as_str).unwrap_or("user");

    let config = AtlasConfig::from_env();
    let store = UserStore::open(&config.users_db_path)?;
    store.create_user(username, password, full_name, role)?;

    println!("✓ Created user '{}' ({})", username, role);

    Ok(())
}

fn run_list_users() -> Result<()> {
    let config = AtlasConfig::from_env();
    let store = UserStore::open(&config.users_db_path)?;

    let users = store.list_users()?;

    if users.is_empty() {
        println!("No users registered yet. Use: creci-atlas adduser");
        return Ok(());
    }

    println!("👤 Registered users");
    for user in users {
        let status = if user.active { "active" } else { "inactive" };
        println!(
            "   {:<16} {:<24} {:<8} {} ({})",
            user.username, user.full_name, user.role, status, user.created_at
        );
    }

    Ok(())
}
