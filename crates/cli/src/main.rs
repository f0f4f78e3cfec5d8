use std::io;
use std::net::IpAddr;

use clap::{Parser, ValueEnum};
use rtsp_session::{
    AudioEncoder, AudioQuality, CameraFacing, SessionBuilder, VideoEncoder, VideoQuality,
};
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "rtsp_session=info";

#[derive(Clone, Copy, ValueEnum)]
enum Video {
    None,
    H264,
    H263,
}

impl From<Video> for VideoEncoder {
    fn from(v: Video) -> Self {
        match v {
            Video::None => VideoEncoder::None,
            Video::H264 => VideoEncoder::H264,
            Video::H263 => VideoEncoder::H263,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Audio {
    None,
    Amrnb,
    Aac,
}

impl From<Audio> for AudioEncoder {
    fn from(a: Audio) -> Self {
        match a {
            Audio::None => AudioEncoder::None,
            Audio::Amrnb => AudioEncoder::AmrNb,
            Audio::Aac => AudioEncoder::Aac,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "rtsp-session",
    about = "Assemble an RTP session, print its SDP and optionally open the streams"
)]
struct Args {
    /// Destination address of the RTP streams
    #[arg(long, short, default_value = "127.0.0.1")]
    destination: IpAddr,

    /// Origin address advertised in the SDP
    #[arg(long)]
    origin: Option<IpAddr>,

    /// Video encoder
    #[arg(long, value_enum, default_value = "h263")]
    video: Video,

    /// Audio encoder
    #[arg(long, value_enum, default_value = "amrnb")]
    audio: Audio,

    /// Video quality as <kbps>-<fps>-<width>-<height>
    #[arg(long)]
    video_quality: Option<VideoQuality>,

    /// Audio quality as <kbps>-<sample rate>
    #[arg(long)]
    audio_quality: Option<AudioQuality>,

    /// Use the front camera
    #[arg(long)]
    front: bool,

    /// Multicast/unicast time-to-live
    #[arg(long, default_value_t = 64)]
    ttl: u32,

    /// Open the RTP sockets after printing the SDP
    #[arg(long)]
    stream: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let args = Args::parse();

    let mut builder = SessionBuilder::global().lock().clone();
    builder
        .set_destination(Some(args.destination))
        .set_origin(args.origin)
        .set_video_encoder(args.video.into())
        .set_audio_encoder(args.audio.into())
        .set_time_to_live(args.ttl);
    if args.front {
        builder.set_camera(CameraFacing::Front);
    }
    if let Some(quality) = args.video_quality {
        builder.set_video_quality(quality);
    }
    if let Some(quality) = args.audio_quality {
        builder.set_audio_quality(quality);
    }

    let mut session = builder.build();
    if let Err(e) = session.configure() {
        eprintln!("Failed to configure session: {e}");
        std::process::exit(1);
    }

    match session.session_description() {
        Ok(sdp) => print!("{sdp}"),
        Err(e) => {
            eprintln!("Failed to describe session: {e}");
            std::process::exit(1);
        }
    }

    if !args.stream {
        return;
    }

    if let Err(e) = session.start() {
        eprintln!("Failed to start session: {e}");
        std::process::exit(1);
    }
    tracing::info!(session_id = session.id(), destination = %args.destination, "streaming");

    println!("Streaming to {}, press Enter to stop", args.destination);
    let mut input = String::new();
    if let Err(e) = io::stdin().read_line(&mut input) {
        eprintln!("Failed to read stdin: {e}");
    }

    tracing::info!(bitrate = session.report_bitrate(), "final bitrate");
    session.stop();
}
