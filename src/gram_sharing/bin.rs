use crate::channel_utils::sync_channel::create_unix_channels;
use crate::channel_utils::sync_channel_by_cb::create_crossbeam_channels;
use crate::channel_utils::tcp_channel::create_tcp_channels;
use crate::cli_utils::{ChannelType, GramShareArgs};
use crate::fixed_point;
use crate::gram_sharing::{reconstruct, tri_idx, DataParty, GramShares, TrustedInitializer};
use crate::input_utils::{even_partition, random_instance};
use crate::session::{pair_sweep, PartyId, SessionConfig};
use anyhow::{Context, Result};
use scuttlebutt::{AbstractChannel, AesRng};
use std::time::Duration;

// One round over one concrete transport: a thread per data party, the
// trusted initializer inline, shares collected at the end.
fn round_on<C>(
    config: &SessionConfig,
    data: &[Vec<f64>],
    target: &[f64],
    mut ti_channels: Vec<(PartyId, C)>,
    channels: Vec<Vec<(PartyId, C)>>,
    rng: &mut AesRng,
    verbose: bool,
) -> Result<Vec<GramShares>>
where
    C: AbstractChannel + Send + 'static,
{
    println!("channels prepared.");

    let handles = channels
        .into_iter()
        .enumerate()
        .map(|(i, mut channels)| {
            let pid = i + 1;
            let config = config.clone();
            let data = data.to_vec();
            let target = target.to_vec();
            std::thread::spawn(move || -> Result<(GramShares, Duration)> {
                let party = DataParty::new(pid, config, &data, &target)
                    .with_context(|| format!("Failed to create party {}.", pid))?;
                let out = party
                    .run(&mut channels)
                    .with_context(|| format!("Failed to run party {}.", pid))?;

                println!("party {} finished.", pid);

                Ok(out)
            })
        })
        .collect::<Vec<_>>();

    let ti = TrustedInitializer::new(config.clone())
        .with_context(|| "Failed to create the trusted initializer.")?;
    ti.run(&mut ti_channels, rng)
        .with_context(|| "Failed to run the trusted initializer.")?;

    println!("trusted initializer finished.");

    let mut shares = Vec::new();
    for (i, handle) in handles.into_iter().enumerate() {
        let (share, waited) = handle.join().expect("Failed to join a party thread.")?;
        if verbose {
            println!("party {} waited {:?} on peers.", i + 1, waited);
        }
        shares.push(share);
    }

    Ok(shares)
}

/// Run one full sharing round with every party in this process: a random
/// instance, one thread per data party, the trusted initializer inline, and
/// a reconstruction check at the end.
pub fn run(args: GramShareArgs) -> Result<()> {
    let GramShareArgs {
        num_parties,
        samples,
        features,
        precision,
        channel_type,
        port,
        verbose,
    } = args;

    let config = SessionConfig::new(
        num_parties,
        samples,
        features,
        even_partition(num_parties, features),
        precision,
    )
    .with_context(|| "Failed to build the session config.")?;

    let mut rng = AesRng::new();
    let (data, target) = random_instance(samples, features, &mut rng);

    println!("instance prepared.");

    let shares = match channel_type {
        ChannelType::Unix => {
            let (ti_channels, channels) =
                create_unix_channels(num_parties).with_context(|| "Failed to create channels.")?;
            round_on(&config, &data, &target, ti_channels, channels, &mut rng, verbose)?
        }
        ChannelType::Tcp => {
            let (ti_channels, channels) = create_tcp_channels(num_parties, port)
                .with_context(|| "Failed to create channels.")?;
            round_on(&config, &data, &target, ti_channels, channels, &mut rng, verbose)?
        }
        ChannelType::CrossBeam => {
            let (ti_channels, channels) = create_crossbeam_channels(num_parties);
            round_on(&config, &data, &target, ti_channels, channels, &mut rng, verbose)?
        }
    };

    let (gram, cross) = reconstruct(&shares);

    // The demo holds every share anyway, so check the round against the
    // inner products of the rescaled inputs computed in the clear.
    let feats = fixed_point::encode_features(&data, precision);
    let tgt = fixed_point::encode_target(&target, precision, features);
    for (i, j) in pair_sweep(features) {
        let row_i = if i < features { &feats[i] } else { &tgt };
        let expected = super::inner_prod(row_i, &feats[j]);
        let got = if i < features {
            gram[tri_idx(i, j)]
        } else {
            cross[j]
        };
        assert_eq!(got, expected, "pair ({}, {})", i, j);
    }

    if verbose {
        for i in 0..features {
            for j in 0..=i {
                print!("{} ", fixed_point::decode(gram[tri_idx(i, j)], precision));
            }
            println!();
        }
        println!(
            "{:?}",
            cross
                .iter()
                .map(|&w| fixed_point::decode(w, precision))
                .collect::<Vec<_>>()
        );
    }

    println!("round complete.");

    Ok(())
}
