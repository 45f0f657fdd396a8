use bd_report_builder::*;
use chrono::{NaiveDate, TimeZone, Utc};

const MONTHLY_ROWS_CSV: &str = "\
bdName,month,totalRegistrations,totalRegisValue,verticalSummary,clientSummary,uniqueVerticals,uniqueClients
Alice,2025-08,4,\"61,500.00\",\"Food: 3 regs / 52,000, Pharma: 1 regs / 9,500\",\"Acme Foods: 4 regs / 61,500\",2,1
Alice,2025-09,2,8000,Pharma: 2 regs / 8000,Globex: 2 regs / 8000,1,1
Alice,2025-10,5,\"12,250.50\",\"Food: 2 regs / 2,250.50, Tech: Cloud: 3 regs / 10,000\",\"Acme Foods: 1 regs / 2,250.50, Initech: 3 regs / 10,000\",2,2
Bob,2025-10,1,700,Retail: 1 regs / 700,,1,
Dana,2025-09,3,0,,,,
";

fn load_rows() -> anyhow::Result<Vec<RawMonthlyRow>> {
    let mut reader = csv::Reader::from_reader(MONTHLY_ROWS_CSV.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn october_clock() -> FixedClock<Utc> {
    FixedClock(Utc.with_ymd_and_hms(2025, 10, 17, 11, 0, 0).unwrap())
}

fn find<'a>(report: &'a [BdAggregate], name: &str) -> &'a BdAggregate {
    report
        .iter()
        .find(|bd| bd.bd_name == name)
        .unwrap_or_else(|| panic!("{} missing from report", name))
}

#[test]
fn test_quarter_report_from_csv_fixture() -> anyhow::Result<()> {
    let rows = load_rows()?;
    assert_eq!(rows.len(), 5);

    let config = ReportConfig {
        time_range: TimeRangeSelection::relative(2),
        ..Default::default()
    };
    let report = build_report(october_clock(), &config, &rows)?;

    assert_eq!(report.labels, vec!["Oct 2025", "Sep 2025", "Aug 2025"]);
    assert_eq!(report.date_range.from_iso(), "2025-08-01T00:00:00.000Z");
    assert_eq!(report.date_range.to_iso(), "2025-10-17T23:59:59.999Z");

    let names: Vec<&str> = report.bds.iter().map(|bd| bd.bd_name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Dana"]);

    let alice = find(&report.bds, "Alice");
    assert_eq!(alice.total_registrations, 11);
    assert!((alice.total_regis_value - 81_750.5).abs() < 1e-6);
    assert_eq!(alice.monthly_summary.len(), 3);
    assert_eq!(alice.monthly_summary[0].month, "Oct 2025");
    assert_eq!(alice.monthly_summary[0].registrations, 5);

    let verticals: Vec<&str> = alice
        .detailed_vertical_summary
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(verticals, vec!["Food", "Pharma", "Tech: Cloud"]);
    assert_eq!(alice.unique_verticals, 3);
    assert_eq!(alice.unique_clients, 3);

    let food = &alice.detailed_vertical_summary[0];
    let counts: Vec<u64> = food.monthly_values.iter().map(|m| m.count).collect();
    assert_eq!(counts, vec![2, 0, 3]);
    assert!((food.total_value() - 54_250.5).abs() < 1e-6);

    let bob = find(&report.bds, "Bob");
    assert_eq!(bob.monthly_summary.len(), 1);
    assert_eq!(bob.unique_clients, 0);

    let dana = find(&report.bds, "Dana");
    assert_eq!(dana.total_registrations, 3);
    assert_eq!(dana.monthly_summary[0].month, "Sep 2025");
    assert!(dana.detailed_vertical_summary.is_empty());
    assert_eq!(dana.unique_verticals, 0);

    let monthly: Vec<u64> = report.totals.monthly.iter().map(|t| t.registrations).collect();
    assert_eq!(monthly, vec![6, 5, 4]);
    assert_eq!(report.totals.total_registrations, 15);

    Ok(())
}

#[test]
fn test_single_month_report_drops_other_months() -> anyhow::Result<()> {
    let rows = load_rows()?;
    let config = ReportConfig {
        time_range: TimeRangeSelection::month("Sep 2025"),
        bd_filter: BdFilter::include(["Alice", "Dana"]),
    };

    let builder = ReportBuilder::new(october_clock());
    let window = builder.window(&config)?;
    assert_eq!(window.labels, vec!["Sep 2025"]);
    assert_eq!(window.range.to_iso(), "2025-09-30T23:59:59.999Z");

    // The backend normally bounds rows to the window; keep only those here.
    let in_window: Vec<RawMonthlyRow> = rows
        .into_iter()
        .filter(|row| row.month.as_deref() == Some("2025-09"))
        .collect();
    let report = builder.build_for_window(&config, window, &in_window);

    let names: Vec<&str> = report.bds.iter().map(|bd| bd.bd_name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Dana"]);

    let alice = find(&report.bds, "Alice");
    assert_eq!(alice.total_registrations, 2);
    assert_eq!(alice.detailed_client_summary[0].name, "Globex");
    assert_eq!(report.totals.monthly[0].registrations, 5);

    Ok(())
}

#[test]
fn test_labels_and_range_agree_across_year_boundary() {
    let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();

    for months_back in 0..=24 {
        let selection = TimeRangeSelection::relative(months_back);
        let labels = generate_labels(&selection, today);
        let range = compute_range(&selection, &now).unwrap();

        assert_eq!(labels.len(), range.months_covered());
        let oldest = YearMonth::parse_label(labels.last().unwrap()).unwrap();
        assert_eq!(
            oldest.first_day().unwrap(),
            range.from_date.naive_local().date()
        );
    }
}

#[test]
fn test_positional_alignment_without_month_keys() {
    let rows = vec![
        RawMonthlyRow::new("Alice", 3, 1000.0).with_verticals("Food: 3 regs / 1000"),
        RawMonthlyRow::new("Alice", 5, 2500.0)
            .with_verticals("Food: 2 regs / 500, Pharma: 3 regs / 2000"),
    ];
    let labels = vec!["Nov".to_string(), "Oct".to_string()];

    let result = group_and_map(&rows, &labels);
    let alice = &result[0];

    assert_eq!(alice.total_registrations, 8);
    assert_eq!(alice.unique_verticals, 2);
    let pharma = &alice.detailed_vertical_summary[1];
    assert_eq!(pharma.name, "Pharma");
    assert_eq!(
        pharma.monthly_values,
        vec![
            MonthlyValue {
                month: "Nov".to_string(),
                count: 3,
                value: 2000.0
            },
            MonthlyValue {
                month: "Oct".to_string(),
                count: 0,
                value: 0.0
            },
        ]
    );
}

#[test]
fn test_backend_json_payload() -> anyhow::Result<()> {
    let body = r#"{"data": [
        {"bdName": "Alice", "month": "2025-10-01T00:00:00.000Z", "totalRegistrations": "2",
         "totalRegisValue": "1500.00", "verticalSummary": "Food: 2 regs / 1,500",
         "clientSummary": null, "uniqueVerticals": "1", "uniqueClients": "0"}
    ]}"#;
    let rows = rows_from_json(body)?;

    let report = build_report(october_clock(), &ReportConfig::default(), &rows)?;
    assert_eq!(report.labels, vec!["Oct 2025"]);
    assert_eq!(report.bds[0].monthly_summary[0].verticals["Food"].count, 2);

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["bds"][0]["bdName"], "Alice");
    assert_eq!(json["bds"][0]["uniqueVerticals"], 1);
    assert_eq!(json["dateRange"]["fromDate"], "2025-10-01T00:00:00.000Z");
    assert_eq!(json["totals"]["monthly"][0]["registrations"], 2);

    Ok(())
}

#[test]
fn test_repeated_builds_are_identical() -> anyhow::Result<()> {
    let rows = load_rows()?;
    let snapshot = rows.clone();
    let config = ReportConfig {
        time_range: TimeRangeSelection::relative(2),
        ..Default::default()
    };

    let first = build_report(october_clock(), &config, &rows)?;
    let second = build_report(october_clock(), &config, &rows)?;

    assert_eq!(first, second);
    assert_eq!(rows, snapshot);
    Ok(())
}
