use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::extract::{extract_salary, extract_skills, extract_work_type};
use crate::models::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportVariant {
    /// Full table for BI tools, with an analysis template
    PowerBi,
    /// Compact table matching the dashboard view
    Dashboard,
}

impl ExportVariant {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            ExportVariant::PowerBi => &[
                "Title",
                "Company",
                "Location",
                "Work Type",
                "Created At",
                "Skills",
                "Salary",
                "Job State",
                "URL",
            ],
            ExportVariant::Dashboard => &[
                "Title",
                "Company",
                "Location",
                "Work Type",
                "Created At",
                "Skills",
            ],
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ExportVariant::PowerBi => "job_data_for_power_bi.csv",
            ExportVariant::Dashboard => "job_data.csv",
        }
    }

    fn skill_separator(self) -> &'static str {
        match self {
            ExportVariant::PowerBi => ";",
            ExportVariant::Dashboard => ", ",
        }
    }

    fn row(self, job: &Job) -> Vec<String> {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        let mut row = vec![
            job.title.clone(),
            text(&job.company_name),
            text(&job.location),
            extract_work_type(job.primary_description.as_deref()).to_string(),
            text(&job.created_at),
            extract_skills(job.description.as_deref()).join(self.skill_separator()),
        ];

        if self == ExportVariant::PowerBi {
            row.push(extract_salary(job.description.as_deref()).unwrap_or_default());
            row.push(text(&job.job_state));
            row.push(text(&job.detail_url));
        }

        row
    }
}

pub const TEMPLATE_FILE_NAME: &str = "power_bi_template.md";

#[derive(Debug)]
pub struct ExportFile {
    pub name: &'static str,
    pub content: String,
}

#[derive(Debug)]
pub struct ExportBundle {
    pub table: ExportFile,
    pub template: Option<ExportFile>,
}

impl ExportBundle {
    pub fn files(&self) -> impl Iterator<Item = &ExportFile> {
        std::iter::once(&self.table).chain(self.template.as_ref())
    }
}

/// Serializes `jobs` as CSV: a bare header line, then one row per job with
/// every field quoted and inner quotes doubled. Every line, the last
/// included, ends in `\n`.
pub fn jobs_to_csv(jobs: &[Job], variant: ExportVariant) -> Result<String> {
    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(variant.columns())?;
    let buf = header
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV header: {}", e))?;

    let mut rows = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf);
    for job in jobs {
        rows.write_record(variant.row(job))
            .with_context(|| format!("Failed to write CSV row for '{}'", job.title))?;
    }
    let buf = rows
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV rows: {}", e))?;

    String::from_utf8(buf).context("CSV output is not UTF-8")
}

pub fn export_jobs(jobs: &[Job], variant: ExportVariant) -> Result<ExportBundle> {
    let table = ExportFile {
        name: variant.file_name(),
        content: jobs_to_csv(jobs, variant)?,
    };

    let template = match variant {
        ExportVariant::PowerBi => Some(ExportFile {
            name: TEMPLATE_FILE_NAME,
            content: analysis_template().to_string(),
        }),
        ExportVariant::Dashboard => None,
    };

    Ok(ExportBundle { table, template })
}

pub fn analysis_template() -> &'static str {
    ANALYSIS_TEMPLATE
}

const ANALYSIS_TEMPLATE: &str = r#"
# Power BI Template for Job Data Analysis

## Data Import Instructions

1. Open Power BI Desktop
2. Click "Get Data" > "Text/CSV"
3. Select the exported job_data_for_power_bi.csv file
4. In the Navigator dialog, click "Load"

## Recommended Visualizations

### Overview Dashboard
- Card visuals for total jobs, companies, and locations
- Pie chart for job types (Remote, Hybrid, On-site)
- Bar chart for top companies
- Line chart for jobs posted over time

### Location Analysis
- Map visualization for job locations
- Bar chart for jobs by city/state
- Slicer for filtering by location

### Skills Analysis
- Word cloud for skills mentioned
- Bar chart for top skills
- Matrix showing skills by company

## Sample DAX Measures

```
// Count of Remote Jobs
Remote Jobs =
CALCULATE(
    COUNTROWS('Jobs'),
    'Jobs'[Work Type] = "Remote"
)

// Count of Hybrid Jobs
Hybrid Jobs =
CALCULATE(
    COUNTROWS('Jobs'),
    'Jobs'[Work Type] = "Hybrid"
)

// Count of On-site Jobs
Onsite Jobs =
CALCULATE(
    COUNTROWS('Jobs'),
    'Jobs'[Work Type] = "On-site"
)

// Jobs by Month
Jobs by Month =
CALCULATE(
    COUNTROWS('Jobs'),
    USERELATIONSHIP('Date'[Date], 'Jobs'[Created At])
)
```

## Recommended Relationships
- Create a Date table and relate it to the Created At field
- Create a Location table for geographic hierarchies
- Create a Skills table for detailed skill analysis

## Advanced Analysis Ideas
- Trend analysis of skills over time
- Correlation between location and job type
- Company hiring patterns
- Salary range analysis by job title and location
"#;
