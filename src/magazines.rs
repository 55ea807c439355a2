//! Registry of publications served by the vendor API
//!
//! Each publication has its own application key pair and product namespace.
//! The registry is a static table; lookups never mutate it.

use crate::error::{Error, Result};

/// Static description of one publication
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Magazine {
    /// Display name, also used in output file names
    pub name: &'static str,
    /// Application key for anonymous user creation
    pub app_key: &'static str,
    /// Secret key paired with `app_key`
    pub secret_key: &'static str,
    /// Namespace segment of this publication's product identifiers
    pub namespace: &'static str,
}

impl Magazine {
    /// Full product namespace, e.g. `com.futurenet.edgemagazine`
    pub fn product_namespace(&self, prefix: &str) -> String {
        if prefix.is_empty() {
            self.namespace.to_string()
        } else {
            format!("{}.{}", prefix, self.namespace)
        }
    }
}

const fn magazine(
    name: &'static str,
    app_key: &'static str,
    secret_key: &'static str,
    namespace: &'static str,
) -> Magazine {
    Magazine {
        name,
        app_key,
        secret_key,
        namespace,
    }
}

/// Every supported publication
pub static MAGAZINES: &[Magazine] = &[
    magazine("3D World", "LAVJyNS_Se-3CwbzRtrUlA", "42fb37c41af55dcf4590afcefcd4f1a4", "3DWorldMagazine"),
    magazine("APC Australia", "i6YbGG5r43qlIGhM2eNUhqwjhnm8cltL", "OJbBdFnYzI2ChBevlnb3oEstVBgE8fn1", "apcmag"),
    magazine("Australian T3", "vzR3YQcRQS6aWn4IkZg7Gg", "28c0579d513200cea0378b5319248893", "AustralianT3"),
    magazine("Comic Heroes", "7rYf2gwWQ5CWHaq8uaiWWQ", "c93cb7db4dd07da3ea6a8343cbad481d", "comicheroesmagazine"),
    magazine("Computer Arts", "er7z5PYeTK6kiin1ps_wzg", "06c15d1e9c50fc47645396de48461adf", "computerartsmagazine"),
    magazine("Computer Music Magazine", "2LYEqLQZTmWlJO20ZHQO0A", "51e19022b496ff733cde1f3885e51dc8", "computermusicmagazine"),
    magazine("Crime Scene", "kXLm815RyixPTWOLOnt7NfenrIJpUigV", "woafeHokZLxG9vrNKg4FbfmdSG2y4vk1", "crimescene"),
    magazine("Digital Camera World", "rkNkeSPyQumn78fjaGdv_Q", "1115db4ad36e0bdc7b8630df7f16028a", "DigitalcameraWorld"),
    magazine("Edge", "RymlyxWkRBKjDKsG3TpLAQ", "b9dd34da8c269e44879ea1be2a0f9f7c", "edgemagazine"),
    magazine("Future Music", "5_pl4TStQsi5VOdyAeIL8A", "10eadee2bbfa1fba350a41de28c00316", "futuremusicmagazine"),
    magazine("GamesMaster", "gKAnhmAQSEyK2Gwrf44JLg", "516ff640ab3d6405676ff288b8bebcee", "gamesmastermagazine"),
    magazine("GD Legacy", "jHsd9gOyRd2bvNCmdOtmXA", "5c74d313bd15f36535a63aa6666aae6f", "guitaristDELUXE"),
    magazine("Guitar Techniques", "2vKIh_6hSTilV_4mLD8n2g", "7eb456cc7339dd7e8e0c3b608f451f78", "guitartechniquesmagazine"),
    magazine("Guitar World Magazine", "IOzwl9bNQzmkoIw3PRBPyA", "6d517bad83ef09aebca1fe304b9367ed", "guitarworldpadmagazine"),
    magazine("Guitarist", "7e7_MyhPTdWaMiQ4ofrACw", "80e79d2ccddb263de9cb5e8da723340c", "GITmonthly"),
    magazine("ImagineFX", "EGqwsSIgQ0mA_sEz2ZPvgA", "a5203ae150bec3a5cd00625f05ee0ec9", "imaginefxmagazine"),
    magazine("iPad User", "ZxGqbTdBS0StEH3rhyCeJg", "ee6b72e1257cf356c685ed4f5d48d649", "ipadusermag"),
    magazine("Linux Format", "DiNG0P_pQnmKtCgvuCIyvQ", "db96a2cc010f0c09f59282c84080bcbe", "linuxformatmagazine"),
    magazine("Mac Life", "eZoIdr2PT2qfM6UOXbV6uw", "j2V3K70211H35J8", "maclifeipadmagazine"),
    magazine("MacFormat", "4li6co3IRoS5-vwcQBlHVg", "94f3880e9b7ba8b94038b36d25c85e7d", "macformatmagazine"),
    magazine("Maximum PC", "O4Eib8kfQ_umkERUOT7zwQ", "097036b27b47b60804bd57a244974b5e", "MaximumPCipadmagazine"),
    magazine("Minecraft Mayhem", "Oj9jKJDY8McwevhuZqT9eH3QqB2ePgeD", "CcagpkZG5jxaezryx84OVazFlAspXOaR", "MinecraftMayhem"),
    magazine("N-Photo", "gMyMneSlTN-Gto8n0_LGfQ", "8c13173ebc36bc18637b86127a567c0e", "nphoto"),
    magazine("net magazine", "rrE7fa_LTuqLn_WtUEXgrg", "80dc20862bec2127bc41b1fbef286808", "netmagazine"),
    magazine("Official Xbox Magazine (US Edition)", "BUi-yPGiQCOOLI03OW022A", "f50334dd99b2f6dbba55e237963d9308", "oxmUSAipadmagazine"),
    magazine("Paint & Draw", "SguLCNbRRztxRIkd8CwIjVzcuEwkZ8HB", "IJZ6TRdJngOu0ViUfUbdUdJqledMn1U3", "paintanddraw"),
    magazine("PC Format Legacy", "qX0qM8IMSrGLc16SbLW3Ww", "21f03ac1ffb3c857105e4d0e91c6249c", "pcformatmagazine"),
    magazine("PC Gamer (UK)", "SVK7cLVtRm2No1xQ3LBGhA", "4ri183rq5pEy04x", "pcgamermagazine"),
    magazine("PC Gamer (US)", "myI5-WslSQaGpIppM0EIsw", "1c8c84d00d04db96f98b124019395a88", "PCGamerUSAipadmagazine"),
    magazine("Photography Week", "5KaijsEVTCOIAs8nITGAOg", "f4d3c95ffac1960c3b8f798f1f541ac0", "photographyweek"),
    magazine("PhotoPlus", "ruM_6_SkSPOIWonMaSIqsA", "e239e189bc9d61056d732f4a242e195d", "photoplusmagazine"),
    magazine("Pi User Magazine", "U2EjNVP6R6ju16v7nyUhmRgRG3MTMu1b", "Wo6huYiCOiarsvt7XMtdQeYyUzrAitTl", "piuser"),
    magazine("Practical Photoshop", "0OQ2GXpKSlyyKipcGLrqGg", "51cdbab13707ddbc0b6c088598dd332a", "practicalphotoshopmagazine"),
    magazine("Professional Photography Magazine", "I9jtZjKCE51qzLJKCzzozG4VsLecxMuO", "1Q1maKYQ11wbMFhZ1DoUdVNj3ionnuao", "prophotography"),
    magazine("Rhythm", "y5PZ04QxQIWb63blvt2PsA", "ef591ab5a83fc3b60454f28bebff0c3a", "rhythmmagazine"),
    magazine("SFX", "JSWr6Lq2R1asm54Prcjfag", "19b87a09ac8f6838ab42b2d3fad70c32", "sfxmagazine"),
    magazine("T3", "qcY8QuyYS327FU8QJXImbw", "0c3cd05357c3b0eb15665769ac2790d1", "t3magazine"),
    magazine("TechLife Australia", "LPcgvEwgMdEQsqfjOwD7nJBBiBnjSHOL", "0FIcDR04qwqAhTJ74J5h444Ax3T4Vols", "techlifeaustralia"),
    magazine("Total Film", "VQzXImWMRZSfiNR0qVThHg", "1cd2829bb1d0b516e70e3b835d6effbb", "totalfilmmagazine"),
    magazine("Total Guitar", "y49rHJvTTuyo7RKVa8I7Aw", "dc1595f1bc7933327df39674c1163377", "totalguitarmagazine"),
    magazine("Windows Help & Advice", "vKx686oTRx6f_Ujd9-POuQ", "0acc0597c77414c7cc1219c8ce9307de", "officialwindowsmagazine"),
];

/// Look up a publication by display name or product namespace (case-insensitive)
pub fn find(name: &str) -> Option<&'static Magazine> {
    let name = name.trim();
    MAGAZINES
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name) || m.namespace.eq_ignore_ascii_case(name))
}

/// Look up a publication, failing with a configuration error if it is unknown
pub fn lookup(name: &str) -> Result<&'static Magazine> {
    find(name).ok_or_else(|| Error::config(format!("unknown magazine '{}'", name), "magazine"))
}
