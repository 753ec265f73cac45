// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Porter-Duff operators with coverage.
//!
//! Each operator is written for partial coverage `ca`. With `ca == MAX` the scaling terms are
//! exact, so the same formula also gives the full-strength result.

use super::{Operation, Premultiplied};

macro_rules! porter_duff {
    ($(#[$attr:meta])* $name:ident, |$s:ident, $d:ident, $ca:ident, $cia:ident| $body:expr) => {
        $(#[$attr])*
        pub(crate) struct $name;

        impl Operation for $name {
            #[inline(always)]
            fn apply<P: Premultiplied>($s: P, $d: P, $ca: u32) -> P {
                let $cia = P::MAX - $ca;
                $body
            }
        }
    };
}

/// `a * b / MAX` on scalars, rounding.
#[inline(always)]
fn mul_scalar<P: Premultiplied>(a: u32, b: u32) -> u32 {
    if P::MAX == 255 {
        raster_common::pixel::div_255(a * b)
    } else {
        raster_common::pixel::div_65535(a * b)
    }
}

porter_duff!(Clear, |_s, d, _ca, cia| d.mul(cia));

porter_duff!(Source, |s, d, ca, cia| if cia == 0 {
    s
} else {
    P::interpolate(s, ca, d, cia)
});

porter_duff!(Destination, |_s, d, _ca, _cia| d);

porter_duff!(SourceOver, |s, d, ca, cia| {
    let s = if cia == 0 { s } else { s.mul(ca) };
    match s.alpha() {
        a if a == P::MAX => s,
        0 => d,
        a => s.add(d.mul(P::MAX - a)),
    }
});

porter_duff!(DestinationOver, |s, d, ca, cia| {
    let s = if cia == 0 { s } else { s.mul(ca) };
    d.add(s.mul(P::MAX - d.alpha()))
});

porter_duff!(SourceIn, |s, d, ca, cia| {
    P::interpolate(s.mul(ca), d.alpha(), d, cia)
});

porter_duff!(DestinationIn, |s, d, ca, cia| {
    d.mul(mul_scalar::<P>(s.alpha(), ca) + cia)
});

porter_duff!(SourceOut, |s, d, ca, cia| {
    P::interpolate(s.mul(ca), P::MAX - d.alpha(), d, cia)
});

porter_duff!(DestinationOut, |s, d, ca, cia| {
    d.mul(mul_scalar::<P>(P::MAX - s.alpha(), ca) + cia)
});

porter_duff!(SourceAtop, |s, d, ca, _cia| {
    let s = s.mul(ca);
    P::interpolate(s, d.alpha(), d, P::MAX - s.alpha())
});

porter_duff!(DestinationAtop, |s, d, ca, cia| {
    let s = s.mul(ca);
    P::interpolate(d, s.alpha() + cia, s, P::MAX - d.alpha())
});

porter_duff!(Xor, |s, d, ca, _cia| {
    let s = s.mul(ca);
    P::interpolate(s, P::MAX - d.alpha(), d, P::MAX - s.alpha())
});

porter_duff!(Plus, |s, d, ca, cia| {
    let sum = d.add_saturate(s);
    if cia == 0 {
        sum
    } else {
        P::interpolate(sum, ca, d, cia)
    }
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{compose, compose_solid};
    use raster_common::Rgba64;

    const DST: [u32; 4] = [0xff204060, 0x80402010, 0x00000000, 0x40404040];
    const SRC: [u32; 4] = [0x80800000, 0xff00ff00, 0x40102030, 0x00000000];

    fn run<O: Operation>(coverage: u8) -> [u32; 4] {
        let mut dst = DST;
        compose::<u32, O>(&mut dst, &SRC, coverage);
        dst
    }

    #[test]
    fn source_over_full_coverage() {
        let out = run::<SourceOver>(255);
        assert_eq!(out[1], 0xff00ff00);
        assert_eq!(out[3], DST[3]);
        // 0x80800000 over opaque 0xff204060 keeps the destination weighted by 127/255.
        assert_eq!(out[0], 0x80800000 + raster_common::pixel::byte_mul(0xff204060, 0x7f));
    }

    #[test]
    fn clear_and_source_at_full_coverage() {
        assert_eq!(run::<Clear>(255), [0; 4]);
        assert_eq!(run::<Source>(255), SRC);
        assert_eq!(run::<Destination>(255), DST);
    }

    #[test]
    fn source_in_uses_destination_alpha() {
        let out = run::<SourceIn>(255);
        assert_eq!(out[0], SRC[0]);
        assert_eq!(out[2], 0);
        let out = run::<DestinationIn>(255);
        assert_eq!(out[1], DST[1]);
        assert_eq!(out[3], 0);
    }

    #[test]
    fn xor_of_opaque_pair_is_transparent() {
        let mut dst = [0xff112233_u32];
        compose::<u32, Xor>(&mut dst, &[0xff445566], 255);
        assert_eq!(dst[0], 0);
    }

    #[test]
    fn plus_saturates() {
        let mut dst = [0x80f00000_u32];
        compose_solid::<u32, Plus>(&mut dst, 0x80200000, 255);
        assert_eq!(dst[0], 0xffff0000);
    }

    #[test]
    fn partial_source_interpolates() {
        let mut dst = [0xff000000_u32];
        compose_solid::<u32, Source>(&mut dst, 0xffffffff, 128);
        assert_eq!(dst[0], 0xff808080);
    }

    #[test]
    fn wide_matches_narrow_for_opaque_source_over() {
        for (s, d) in SRC.iter().zip(DST.iter()) {
            let mut narrow = [*d];
            compose::<u32, SourceOver>(&mut narrow, &[*s], 255);
            let mut wide = [Rgba64::from_argb32(*d)];
            compose::<Rgba64, SourceOver>(&mut wide, &[Rgba64::from_argb32(*s)], 255);
            let w = wide[0].to_argb32();
            for shift in [0, 8, 16, 24] {
                let a = (narrow[0] >> shift) & 0xff;
                let b = (w >> shift) & 0xff;
                assert!(a.abs_diff(b) <= 1, "{s:08x} over {d:08x}");
            }
        }
    }
}
