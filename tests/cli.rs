use assert_cmd::cargo::cargo_bin_cmd;

fn fixture(path: &str) -> String {
    format!("{}/tests/fixtures/{path}", env!("CARGO_MANIFEST_DIR"))
}

fn run(args: &[&str]) -> String {
    let mut cmd = cargo_bin_cmd!("wellness-leaderboard");
    cmd.env_remove("WELLNESS_DATA")
        .env_remove("WELLNESS_FORMULAS")
        .args(args);
    let out = cmd.assert().success();
    String::from_utf8(out.get_output().stdout.clone()).expect("utf8")
}

#[test]
fn leaderboard_breaks_ties_by_input_order() {
    let data = fixture("employees.csv");
    let stdout = run(&["--data", data.as_str(), "leaderboard"]);

    let jules = stdout.find("🥇 Jules Moreno (E002) 90 pts").expect("jules first");
    let kiara = stdout.find("🥈 Kiara Patel (E003) 90 pts").expect("kiara second");
    let avery = stdout.find("🥉 Avery Lee (E001) 77 pts").expect("avery third");
    assert!(jules < kiara && kiara < avery);
    assert!(stdout.contains("#5 Maya Neon (E004) 42 pts"));
}

#[test]
fn teams_rank_by_average() {
    let data = fixture("employees.csv");
    let stdout = run(&["--data", data.as_str(), "teams"]);

    let engineering = stdout.find("🥇 Engineering: avg 83.5").expect("engineering");
    let finance = stdout.find("🥈 Finance: avg 70.0").expect("finance");
    let marketing = stdout.find("🥉 Marketing: avg 66.0").expect("marketing");
    assert!(engineering < finance && finance < marketing);
}

#[test]
fn teams_fail_on_missing_group_field() {
    let data = fixture("employees.csv");
    let mut cmd = cargo_bin_cmd!("wellness-leaderboard");
    cmd.env_remove("WELLNESS_DATA")
        .args(["--data", data.as_str(), "teams", "--group-by", "department"]);
    cmd.assert().failure();
}

#[test]
fn foods_use_nutrition_points() {
    let data = fixture("foods.csv");
    let stdout = run(&["--data", data.as_str(), "foods"]);

    assert!(stdout.contains("🥇 Grilled Chicken Bowl 118 pts (520 kcal)"));
    assert!(stdout.contains("🥈 Lentil Soup 104 pts (300 kcal)"));
    assert!(stdout.contains("#4 Fried Samosa 97 pts (450 kcal)"));
}

#[test]
fn market_prices_teams() {
    let data = fixture("employees.csv");
    let stdout = run(&["--data", data.as_str(), "market"]);

    assert!(stdout.contains("🥇 FIN (Finance, 1 members) $82.00"));
    assert!(stdout.contains("🥈 MAR (Marketing, 2 members) $77.00"));
    assert!(stdout.contains("🥉 ENG (Engineering, 2 members) $76.00"));
}

#[test]
fn exact_team_challenge_is_deterministic() {
    let data = fixture("employees.csv");
    let stdout = run(&[
        "--data",
        data.as_str(),
        "challenge",
        "--id",
        "1",
        "--left",
        "Engineering",
        "--right",
        "Marketing",
        "--teams",
        "--exact",
    ]);
    assert!(stdout.contains("Run 5km: Engineering (7150) vs Marketing (7350). Winner: Marketing"));
}

#[test]
fn lower_bmi_wins_lunch_challenge() {
    let data = fixture("employees.csv");
    let stdout = run(&[
        "--data",
        data.as_str(),
        "challenge",
        "--id",
        "4",
        "--left",
        "E001",
        "--right",
        "E002",
        "--exact",
    ]);
    assert!(stdout.contains("Winner: E002"));
}

#[test]
fn seeded_challenge_repeats() {
    let data = fixture("employees.csv");
    let args = [
        "--data",
        data.as_str(),
        "challenge",
        "--id",
        "3",
        "--left",
        "E001",
        "--right",
        "E005",
        "--seed",
        "11",
    ];
    assert_eq!(run(&args), run(&args));
}

#[test]
fn simulate_applies_script_and_skips_rejections() {
    let data = fixture("employees.csv");
    let commands = fixture("commands.json");
    let stdout = run(&["--data", data.as_str(), "simulate", "--commands", commands.as_str()]);

    let state: serde_json::Value = serde_json::from_str(&stdout).expect("state json");
    assert_eq!(state["store_points"], 2250);
    assert_eq!(state["orders"], 1);
    assert_eq!(state["coins"], 1090.0);
    assert_eq!(state["players"][3]["points"], 110);
    assert_eq!(state["players"][4]["points"], 172);
    assert_eq!(state["owned_items"], serde_json::json!(["shelter"]));
}

#[test]
fn report_is_written() {
    let data = fixture("employees.csv");
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("report.md");
    let out_arg = out.to_str().expect("utf8 path");
    run(&["--data", data.as_str(), "report", "--out", out_arg]);

    let report = std::fs::read_to_string(&out).expect("report");
    assert!(report.contains("# Wellness Leaderboard Report"));
    assert!(report.contains("🥇 Jules Moreno (E002) 90 pts"));
    assert!(report.contains("- ENG (Engineering) $76.00"));
}

#[test]
fn formulas_list_builtins_and_file_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("formulas.toml");
    std::fs::write(
        &path,
        "[[formula]]\nname = \"hydration\"\nterms = [{ metric = \"water_ml\", weight = 0.01, sign = \"reward\" }]\n",
    )
    .expect("write formulas");

    let stdout = run(&["--formulas", path.to_str().expect("utf8 path"), "formulas"]);
    assert!(stdout.contains(
        "nutrition-points: 100 + 0.5 * protein - 0.2 * fat - 0.1 * calories/100 (Nearest)"
    ));
    assert!(stdout.contains("hydration: 0 + 0.01 * water_ml (Exact)"));
}

#[test]
fn missing_data_is_reported() {
    let mut cmd = cargo_bin_cmd!("wellness-leaderboard");
    cmd.env_remove("WELLNESS_DATA").arg("leaderboard");
    cmd.assert().failure();
}

#[test]
fn survival_leaderboard_shows_badges() {
    let data = fixture("employees.csv");
    let stdout = run(&["--data", data.as_str(), "leaderboard", "--formula", "survival"]);

    assert!(stdout.contains("🥇 Jules Moreno (E002) 20 pts [Shadow Explorer]"));
    assert!(stdout.contains("#5 Maya Neon (E004) 14.3 pts [Jungle Rookie]"));
}

#[test]
fn teams_can_average_top_members_only() {
    let data = fixture("employees.csv");
    let stdout = run(&["--data", data.as_str(), "teams", "--top", "1"]);

    assert!(stdout.contains("🥇 Engineering: avg 90.0, total 90.0 top 1 members"));
    assert!(stdout.contains("🥈 Marketing: avg 90.0, total 90.0 top 1 members"));
    assert!(stdout.contains("🥉 Finance: avg 70.0, total 70.0 top 1 members"));
}

#[test]
fn team_flag_needs_a_rival() {
    let data = fixture("employees.csv");
    let mut cmd = cargo_bin_cmd!("wellness-leaderboard");
    cmd.env_remove("WELLNESS_DATA").args([
        "--data",
        data.as_str(),
        "challenge",
        "--id",
        "1",
        "--left",
        "Engineering",
        "--teams",
    ]);
    cmd.assert().failure();
}

#[test]
fn foods_recommend_a_meal_within_target() {
    let data = fixture("foods.csv");
    let args = ["--data", data.as_str(), "foods", "--recommend", "--seed", "5"];
    let stdout = run(&args);

    assert!(stdout.contains("Recommended meal (1450 of 2500 kcal):"));
    assert!(stdout.contains("- Lentil Soup (300 kcal, 104 pts)"));
    assert_eq!(stdout, run(&args));
}

#[test]
fn survival_formula_lists_sleep_term() {
    let stdout = run(&["formulas"]);
    assert!(stdout.contains(
        "survival: 10 + 10 * clamp((sleep_hours - 5)/4, 0, 1) + 1 * clamp(step_count/1000, 0, 10) (Tenths)"
    ));
}

#[test]
fn rust_log_enables_debug_output() {
    let data = fixture("employees.csv");
    let mut cmd = cargo_bin_cmd!("wellness-leaderboard");
    cmd.env_remove("WELLNESS_DATA")
        .env("RUST_LOG", "wellness_leaderboard=debug")
        .args(["--data", data.as_str(), "leaderboard"]);
    let out = cmd.assert().success();
    let stderr = String::from_utf8(out.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("records loaded"));
}
