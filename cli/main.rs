#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use gailrisk::assessment::{
    Questionnaire, RaceGroup, RiskAssessment, assess, assess_records, read_questionnaires,
    write_report,
};
use gailrisk::{
    HazardIntegrator, Race, RawRiskFactors, Response, RiskResult, RiskTableRepository,
};

#[derive(Parser)]
#[command(
    name = "gailrisk",
    about = "Absolute breast cancer risk projection (Gail model 2)",
    long_about = "Projects the probability of developing invasive breast cancer over an age \
                 interval from demographic and clinical risk factors, using the competing-risks \
                 model calibrated per race/ethnicity group."
)]
struct Cli {
    /// Risk tables in TOML format to use instead of the embedded BCRAT tables
    #[arg(long, global = true, value_name = "TOML")]
    tables: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct AssessArgs {
    /// Current age (35-85)
    #[arg(long)]
    age: u32,

    /// white, african_american, hispanic, asian_pacific_islander or other
    #[arg(long)]
    race: RaceGroup,

    /// Asian/Pacific Islander subgroup race code (7-12)
    #[arg(long, value_name = "CODE")]
    asian_subgroup: Option<u8>,

    /// Age at first menstrual period (7-17)
    #[arg(long)]
    menarche: u32,

    /// Age at first live birth; omit when there has been none
    #[arg(long, value_name = "AGE")]
    first_birth: Option<u32>,

    /// Number of first-degree relatives with breast cancer
    #[arg(long, default_value = "0")]
    relatives: u32,

    /// Ever had a breast biopsy (yes, no, unknown)
    #[arg(long, default_value = "unknown")]
    ever_had_biopsy: Response,

    /// Number of breast biopsies
    #[arg(long, value_name = "N")]
    biopsies: Option<u32>,

    /// Atypical hyperplasia found on a biopsy (yes, no, unknown)
    #[arg(long, default_value = "unknown")]
    hyperplasia: Response,

    /// History of breast cancer, DCIS, LCIS or chest radiotherapy
    #[arg(long)]
    cancer_history: bool,

    /// Known BRCA1/BRCA2 mutation (yes, no, unknown)
    #[arg(long, default_value = "unknown")]
    genetic_mutation: Response,

    /// Print the assessment as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ProjectArgs {
    #[arg(long)]
    current_age: f64,

    #[arg(long)]
    projection_age: f64,

    /// Race code (1-12)
    #[arg(long, default_value = "1")]
    race: u8,

    /// Menarche category (0: 14 or older, 1: 12-13, 2: under 12)
    #[arg(long, default_value = "0")]
    menarche: u8,

    /// First live birth category (0: under 20, 1: 20-24, 2: 25-29 or none, 3: 30 or older)
    #[arg(long, default_value = "0")]
    first_birth: u8,

    /// Number of affected first-degree relatives; omit if unknown
    #[arg(long)]
    relatives: Option<u32>,

    #[arg(long, default_value = "unknown")]
    ever_had_biopsy: Response,

    /// Number of biopsies; omit if unknown
    #[arg(long)]
    biopsies: Option<u32>,

    #[arg(long, default_value = "unknown")]
    hyperplasia: Response,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess one person from questionnaire answers
    #[command(about = "Five-year and lifetime risk from questionnaire answers")]
    Assess(AssessArgs),

    /// Assess every questionnaire in a CSV file
    #[command(about = "Assess a CSV of questionnaires (outputs: assessments.tsv)")]
    Batch {
        /// CSV file with one questionnaire per row and a header of field names
        #[arg(value_name = "CSV")]
        input: PathBuf,

        #[arg(long, default_value = "assessments.tsv")]
        output: PathBuf,
    },

    /// Project risk directly from model categories
    #[command(about = "Raw engine projection over [current age, projection age]")]
    Project(ProjectArgs),

    /// Write the risk tables in use to a TOML file
    #[command(about = "Export the risk tables (outputs: tables.toml)")]
    Tables {
        #[arg(long, default_value = "tables.toml")]
        output: PathBuf,
    },

    /// List the race/ethnicity codes the model is calibrated for
    #[command(about = "List race codes for --race and --asian-subgroup")]
    Races,

    /// Display version information
    #[command(about = "Display version information")]
    Version,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Cli { tables, command } = Cli::parse();
    let tables = tables.as_deref();

    let result = match command {
        Some(Commands::Assess(args)) => run_assess(tables, args),
        Some(Commands::Batch { input, output }) => run_batch(tables, &input, &output),
        Some(Commands::Project(args)) => run_project(tables, args),
        Some(Commands::Tables { output }) => run_tables(tables, &output),
        Some(Commands::Races) => {
            print_races();
            Ok(())
        }
        Some(Commands::Version) => {
            println!("gailrisk {}", env!("CARGO_PKG_VERSION"));
            println!("Model: Gail model 2 (BCRAT), 12 race/ethnicity groups, ages 20-90");
            Ok(())
        }
        None => Cli::command().print_help().map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_races() {
    println!("Race groups (assess --race): white, african_american, hispanic, asian_pacific_islander, other");
    println!();
    println!("Race codes (project --race):");
    for race in Race::ALL {
        let note = if race.is_asian_subgroup() {
            "  (assess --asian-subgroup)"
        } else {
            ""
        };
        println!("  {:>2}  {}{note}", race.code(), race.name());
    }
}

fn load_repository(tables: Option<&Path>) -> Result<RiskTableRepository, Box<dyn Error>> {
    let repository = match tables {
        Some(path) => RiskTableRepository::load(path)?,
        None => RiskTableRepository::bcrat()?,
    };
    Ok(repository)
}

fn load_engine(tables: Option<&Path>) -> Result<HazardIntegrator, Box<dyn Error>> {
    Ok(HazardIntegrator::new(Arc::new(load_repository(tables)?))?)
}

fn run_assess(tables: Option<&Path>, args: AssessArgs) -> Result<(), Box<dyn Error>> {
    let engine = load_engine(tables)?;
    let questionnaire = Questionnaire {
        has_breast_cancer_history: args.cancer_history,
        has_genetic_mutation: args.genetic_mutation,
        age: args.age,
        race: args.race,
        asian_subgroup: args.asian_subgroup,
        ever_had_biopsy: args.ever_had_biopsy,
        number_of_biopsies: args.biopsies,
        has_atypical_hyperplasia: args.hyperplasia,
        age_at_menarche: args.menarche,
        age_at_first_birth: args.first_birth,
        num_first_degree_relatives: args.relatives,
    };
    let assessment = assess(&engine, &questionnaire)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        print_assessment(&assessment);
    }
    Ok(())
}

fn print_assessment(assessment: &RiskAssessment) {
    println!("Race/ethnicity: {}", assessment.race);
    print_window("5-year risk", &assessment.five_year);
    print_window("Lifetime risk", &assessment.lifetime);
    println!("Risk category: {}", assessment.category);
    println!();
    println!("{}", assessment.interpretation);
    println!();
    println!("Recommendations:");
    for recommendation in &assessment.recommendations {
        println!("  - {recommendation}");
    }
}

fn print_window(label: &str, result: &RiskResult) {
    println!(
        "{label} (age {} to {}): absolute {:.2}%, average {:.2}%, relative {:.2}",
        result.current_age,
        result.projection_age,
        result.absolute_risk * 100.0,
        result.average_risk * 100.0,
        result.relative_risk
    );
}

fn run_batch(tables: Option<&Path>, input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let engine = load_engine(tables)?;
    println!("Loading questionnaires from: {}", input.display());
    let records = read_questionnaires(input)?;
    println!("Loaded {} questionnaires", records.len());

    let results = assess_records(&engine, records);
    let failures = results.iter().filter(|result| result.is_err()).count();
    write_report(output, &results)?;

    println!(
        "Assessed {} questionnaires ({} rejected)",
        results.len() - failures,
        failures
    );
    println!("Assessments saved to: {}", output.display());
    Ok(())
}

fn run_project(tables: Option<&Path>, args: ProjectArgs) -> Result<(), Box<dyn Error>> {
    let engine = load_engine(tables)?;
    let raw = RawRiskFactors {
        current_age: args.current_age,
        projection_age: args.projection_age,
        menarche: args.menarche,
        first_birth: args.first_birth,
        relatives: args.relatives,
        ever_had_biopsy: args.ever_had_biopsy,
        biopsy_count: args.biopsies,
        hyperplasia: args.hyperplasia,
        race: args.race,
    };
    let result = engine.project(&raw)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Race/ethnicity: {}", result.race);
        println!("Risk period: {} years", result.risk_period());
        print_window("Projected risk", &result);
    }
    Ok(())
}

fn run_tables(tables: Option<&Path>, output: &Path) -> Result<(), Box<dyn Error>> {
    let repository = load_repository(tables)?;
    repository.save(output)?;
    println!("Risk tables saved to: {}", output.display());
    Ok(())
}
