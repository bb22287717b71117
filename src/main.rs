use clap::Parser;
use color_eyre::eyre;
use cxlbridgesim::{cmd::Cmd, config::Config, packet, port::QueuePeer, Bridge, Packet};
use itertools::Itertools;
use std::collections::VecDeque;

#[derive(Debug, Parser)]
#[command(author, version, about = "Timing model of a CXL.cache-style protocol bridge")]
struct Options {
    /// Number of host transactions to issue
    #[arg(short = 'n', long, default_value = "1000")]
    num_requests: usize,
    /// Link traversal latency in cycles
    #[arg(long, default_value = "50")]
    link_latency: u64,
    /// Protocol conversion latency in cycles
    #[arg(long, default_value = "12")]
    proto_latency: u64,
    /// Device-bound transmit queue depth
    #[arg(long, default_value = "128")]
    req_queue_capacity: usize,
    /// Host-bound transmit queue depth
    #[arg(long, default_value = "128")]
    resp_queue_capacity: usize,
    /// Outstanding-response window
    #[arg(long, default_value = "128")]
    resp_limit: usize,
    /// Device ingress buffer depth (small values force backpressure)
    #[arg(long, default_value = "4")]
    device_buffer: usize,
    /// Device consumes one request every this many cycles
    #[arg(long, default_value = "4")]
    device_service_period: u64,
    /// Device turnaround before a response heads back
    #[arg(long, default_value = "20")]
    device_turnaround: u64,
}

const CYCLE_LIMIT: u64 = 100_000_000;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();
    let options = Options::parse();

    let config = Config {
        link_latency: options.link_latency,
        proto_latency: options.proto_latency,
        req_queue_capacity: options.req_queue_capacity,
        resp_queue_capacity: options.resp_queue_capacity,
        resp_limit: options.resp_limit,
        ..Config::default()
    };
    let host_peer = QueuePeer::new(options.resp_queue_capacity);
    let device_peer = QueuePeer::new(options.device_buffer);
    let mut bridge = Bridge::new(config, host_peer, device_peer)?;

    println!(
        "bridge claims {}",
        bridge.address_ranges().iter().map(ToString::to_string).join(", ")
    );

    // a synthetic host workload: reads, exclusive acquisitions, and
    // fire-and-forget evictions over the claimed window
    let commands = [
        Cmd::ReadReq,
        Cmd::WriteReq,
        Cmd::WritebackDirty,
        Cmd::ReadExReq,
        Cmd::CleanEvict,
        Cmd::UpgradeReq,
    ];
    let base_addr = bridge.address_ranges()[0].start;

    let mut issued = 0usize;
    let mut completed = 0usize;
    let mut host_stalled = false;
    let mut device_stalled = false;
    let mut in_service: VecDeque<(u64, Packet)> = VecDeque::new();
    let mut cycle = 0u64;

    while issued < options.num_requests || bridge.busy() || !in_service.is_empty() {
        if bridge.host_peer.take_resume() {
            host_stalled = false;
        }
        if bridge.device_peer.take_resume() {
            device_stalled = false;
        }

        if issued < options.num_requests && !host_stalled {
            let cmd = commands[issued % commands.len()];
            let addr = base_addr + (issued as u64 % 4096) * 0x40;
            let request = packet::Builder { addr, cmd, size: 64, data: None }.build();
            host_stalled = !bridge.recv_host_request(request, cycle);
            issued += 1;
        }

        bridge.process_events(cycle);

        // the device services one request per period and answers
        // everything that owes a response after its turnaround
        if cycle % options.device_service_period.max(1) == 0 {
            let was_full = bridge.device_peer.queue.full();
            if let Some(request) = bridge.device_peer.pop() {
                if request.cmd.needs_response() {
                    in_service.push_back((cycle + options.device_turnaround, request));
                }
                if was_full {
                    bridge.on_device_retry_ready(cycle);
                }
            }
        }

        while !device_stalled {
            match in_service.front() {
                Some((ready, _)) if *ready <= cycle => {
                    let (_, request) = in_service.pop_front().unwrap();
                    let response = packet::Builder {
                        addr: request.addr,
                        cmd: Cmd::ReadResp,
                        size: request.size,
                        data: None,
                    }
                    .build();
                    device_stalled = !bridge.recv_device_response(response, cycle);
                }
                _ => break,
            }
        }

        // the host fabric drains responses as fast as they arrive
        while bridge.host_peer.pop().is_some() {
            completed += 1;
        }

        cycle += 1;
        if cycle > CYCLE_LIMIT {
            eyre::bail!("simulation did not converge after {CYCLE_LIMIT} cycles");
        }
    }

    let dropped = bridge.drain(cycle);
    eyre::ensure!(dropped.is_empty(), "packets left in flight: {}", dropped.len());

    println!("issued {issued} requests, completed {completed} responses in {cycle} cycles");
    println!("{}", serde_json::to_string_pretty(bridge.stats())?);
    Ok(())
}
