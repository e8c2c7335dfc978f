//! NMEA decode micro-benchmark.
//!
//! Measures:
//! - one GGA sentence through the character state machine
//! - one full interval (GGA, GSA, GSV, RMC) including the merge and publish
//! - GGA + RMC formatting of a populated fix

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};

use asm_gnss::{NmeaParser, Valid, format_gga, format_rmc, format_sentence};

const GGA: &str = "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,";
const GSA: &str = "GNGSA,A,3,01,02,12,14,,,,,,,,,1.8,0.9,1.5";
const GSV: &str = "GPGSV,2,1,08,01,40,083,46,02,17,308,41,12,07,344,39,14,22,228,45";
const RMC: &str = "GPRMC,123520,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W,A";

fn bench_single_sentence(c: &mut Criterion) {
    let gga = format_sentence(GGA);
    let mut parser = NmeaParser::new();
    let mut group = c.benchmark_group("nmea");
    group.throughput(Throughput::Bytes(gga.len() as u64));
    group.bench_function("decode_gga", |b| {
        b.iter(|| parser.feed(black_box(gga.as_bytes())));
    });
    group.finish();
}

fn bench_interval(c: &mut Criterion) {
    let burst: String = [GGA, GSA, GSV, RMC]
        .iter()
        .map(|s| format_sentence(s))
        .collect();
    let mut parser = NmeaParser::new();
    let mut group = c.benchmark_group("nmea");
    group.throughput(Throughput::Bytes(burst.len() as u64));
    group.bench_function("decode_interval", |b| {
        b.iter(|| {
            parser.feed(black_box(burst.as_bytes()));
            parser.take_fix()
        });
    });
    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let mut parser = NmeaParser::new();
    parser.feed(format_sentence(GGA).as_bytes());
    parser.feed(format_sentence(RMC).as_bytes());
    let Some(fix) = parser.take_fix() else {
        return;
    };
    assert!(fix.has(Valid::LOCATION));

    c.bench_function("format_gga_rmc", |b| {
        b.iter(|| {
            let fix = black_box(&fix);
            (format_gga(fix), format_rmc(fix))
        });
    });
}

criterion_group!(benches, bench_single_sentence, bench_interval, bench_format);
criterion_main!(benches);
