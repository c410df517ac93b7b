use console::Style;
use pvreduce_core::correct::FitReport;
use pvreduce_core::pipeline::config::PipelineConfig;
use pvreduce_core::report::GroupSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn rule(len: usize) -> String {
    "\u{2550}".repeat(len)
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("PV Reduction Pipeline"));
    println!("  {}", s.title.apply_to(rule(21)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    match config.film_db {
        Some(ref db) => println!(
            "  {:<14}{}",
            s.label.apply_to("Film DB"),
            s.path.apply_to(db.display())
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Film DB"),
            s.disabled.apply_to("none")
        ),
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Overwrite"),
        s.value.apply_to(if config.overwrite.all { "all" } else { "cached" })
    );
    println!();

    println!("  {}", s.header.apply_to("Selection"));
    if config.exclude.is_empty() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Exclude"),
            s.disabled.apply_to("none")
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Exclude"),
            s.value.apply_to(format!("{:?}", config.exclude))
        );
    }
    match config.range {
        Some(range) => println!(
            "    {:<12}{}",
            s.label.apply_to("Range"),
            s.value.apply_to(format!("{}..={}", range.min, range.max))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Range"),
            s.disabled.apply_to("all")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Corrections"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Temperature"),
        if config.temperature.enabled {
            s.method.apply_to("enabled")
        } else {
            s.disabled.apply_to("disabled")
        }
    );
    match config.irradiance {
        Some(ref irr) => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Irradiance"),
                s.method.apply_to(format!("irrad{}", irr.channel))
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Baseline"),
                s.value.apply_to(&irr.baseline)
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("One sun"),
                s.value.apply_to(irr.one_sun)
            );
        }
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Irradiance"),
            s.disabled.apply_to("disabled")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Aggregation"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Average by"),
        s.method.apply_to(config.average_by)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Reference"),
        s.value.apply_to(&config.reference_name)
    );
    println!();
}

pub fn print_fit_report(title: &str, report: &FitReport) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to(title));
    println!("  {}", s.title.apply_to(rule(title.chars().count())));
    println!(
        "  {:<14}{}",
        s.label.apply_to("X axis"),
        s.value.apply_to(&report.x_axis)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Points"),
        s.value.apply_to(report.x.len())
    );
    for metric in &report.metrics {
        println!(
            "    {:<12}{}",
            s.label.apply_to(&metric.metric),
            s.method.apply_to(metric.fit)
        );
    }
}

const GROUP_HEADERS: [&str; 10] = [
    "Grp",
    "Matrix",
    "QD Type",
    "Emis.",
    "QD Conc.",
    "Solvent",
    "Addit.",
    "Addit. conc.",
    "Made",
    "Measured",
];

pub fn print_group_table(groups: &[GroupSummary]) {
    let s = Styles::new();

    println!("{}", s.header.apply_to(GROUP_HEADERS.join("\t")));
    for group in groups {
        let mut cells = vec![group.group.to_string()];
        cells.extend(group.attributes.iter().map(|(_, v)| v.clone()));
        for date in [group.manufactured, group.measured] {
            cells.push(date.map_or_else(|| "None".to_string(), |d| d.to_string()));
        }
        println!("{}", cells.join("\t"));
    }
    if groups.is_empty() {
        println!("{}", s.disabled.apply_to("no groups"));
    }
}
