use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::{contains, diff};

/// `ls8 run <path> --minimal` with stdin detached from any terminal.
fn run_minimal(path: &str) -> Command {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("run")
        .arg(path)
        .arg("--minimal")
        .arg("--features")
        .arg("interrupts")
        .write_stdin("");
    cmd
}

#[test]
fn runs_without_arguments() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.assert().success().stdout(contains("ls8"));
}

#[test]
fn prints_eight() {
    run_minimal("tests/files/print8.ls8")
        .assert()
        .success()
        .stdout(diff("8\n"));
}

#[test]
fn multiplies() {
    run_minimal("tests/files/mult.ls8")
        .assert()
        .success()
        .stdout(diff("72\n"));
}

#[test]
fn runs_binary_image() {
    run_minimal("tests/files/mult.bin")
        .assert()
        .success()
        .stdout(diff("72\n"));
}

#[test]
fn pops_in_reverse_order() {
    run_minimal("tests/files/stack.ls8")
        .assert()
        .success()
        .stdout(diff("3\n2\n1\n"));
}

#[test]
fn returns_from_subroutines() {
    run_minimal("tests/files/call.ls8")
        .assert()
        .success()
        .stdout(diff("10\n20\n"));
}

#[test]
fn loops_until_zero() {
    run_minimal("tests/files/countdown.ls8")
        .assert()
        .success()
        .stdout(diff("5\n4\n3\n2\n1\n"));
}

#[test]
fn prints_characters() {
    run_minimal("tests/files/hello.ls8")
        .assert()
        .success()
        .stdout(diff("Hi!\n"));
}

#[test]
fn services_software_interrupt() {
    run_minimal("tests/files/interrupt.ls8")
        .assert()
        .success()
        .stdout(diff("42\n7\n"));
}

#[test]
fn interrupt_opcodes_need_feature() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("run")
        .arg("tests/files/interrupt.ls8")
        .arg("--minimal")
        .arg("--features=")
        .write_stdin("");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown opcode 0b01010010"));
}

#[test]
fn halts_on_divide_by_zero() {
    run_minimal("tests/files/divzero.ls8")
        .assert()
        .success()
        .stdout(contains("cannot divide by zero"))
        .stdout(contains("0x06"))
        .stdout(contains("10").not());
}

#[test]
fn fails_on_unknown_opcode() {
    run_minimal("tests/files/bad_opcode.ls8")
        .assert()
        .failure()
        .stderr(contains("Unknown opcode 0b11111111 at 0x03"));
}

#[test]
fn reports_status_messages() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("run")
        .arg("tests/files/mult.ls8")
        .arg("--features")
        .arg("interrupts")
        .write_stdin("");
    cmd.assert()
        .success()
        .stdout(contains("Loading"))
        .stdout(contains("72"))
        .stdout(contains("Halted"))
        .stdout(contains("Completed"));
}

#[test]
fn runs_path_without_subcommand() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.env("LS8_FEATURES", "interrupts")
        .arg("tests/files/print8.ls8")
        .write_stdin("");
    cmd.assert().success().stdout(contains("8"));
}

#[test]
fn traces_each_cycle() {
    let mut cmd = run_minimal("tests/files/print8.ls8");
    cmd.arg("--trace");
    cmd.assert()
        .success()
        .stdout(diff("8\n"))
        .stderr(contains("TRACE: 00 | 82 00 08 |"))
        .stderr(contains("| LDI R0,8"))
        .stderr(contains("| PRN R0"))
        .stderr(contains("| HLT"));
}

#[test]
fn dumps_registers() {
    let mut cmd = run_minimal("tests/files/mult.ls8");
    cmd.arg("--dump");
    cmd.assert()
        .success()
        .stderr(contains("R0 72"))
        .stderr(contains("R1 9"))
        .stderr(contains("R7 244"));
}

#[test]
fn rejects_unknown_features() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("run")
        .arg("tests/files/print8.ls8")
        .arg("--features")
        .arg("sound");
    cmd.assert().failure().stderr(contains("sound"));
}

#[test]
fn rejects_bad_tokens() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("check").arg("tests/files/bad_token.ls8");
    cmd.assert()
        .failure()
        .stderr(contains("Encountered an unknown token"));
}

#[test]
fn rejects_unknown_extension() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("run").arg("tests/files/program.txt");
    cmd.assert()
        .failure()
        .stderr(contains("File has unknown extension"));
}

#[test]
fn fails_on_missing_file() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("run").arg("tests/files/missing.ls8").write_stdin("");
    cmd.assert().failure();
}

#[test]
fn checks_program() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("check").arg("tests/files/mult.ls8");
    cmd.assert()
        .success()
        .stdout(contains("12 bytes, no errors found!"));
}

#[test]
fn disassembles_program() {
    let mut cmd = Command::cargo_bin("ls8").unwrap();
    cmd.arg("disasm").arg("tests/files/print8.ls8");
    cmd.assert().success().stdout(diff(
        "0x00  10000010 00000000 00001000  LDI R0,8\n\
         0x03  01000111 00000000           PRN R0\n\
         0x05  00000001                    HLT\n",
    ));
}
