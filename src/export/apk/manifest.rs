//! `AndroidManifest.xml` generation.
//!
//! The player template supplies the `<application>` element; the header,
//! permissions and the service/activity entries each feature needs are
//! generated around it.

use super::settings::{ApkSettings, ArCore, Permissions};

const ADDITIONAL_FILTERS: &str = "<!--ADDITIONAL_INTENT_FILTERS-->";

/// Build the manifest from the player's template.
pub fn render_manifest(settings: &ApkSettings, template: &str) -> String {
    let package = &settings.package_name;
    let has = |flag: u32| settings.permissions.has(flag);
    let google = settings.is_google();

    let mut xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
      android:versionCode="{build}"
      android:versionName="{version}" package="{package}" android:installLocation="auto">
    <uses-feature android:glEsVersion="0x00020000"></uses-feature>
    <uses-sdk android:minSdkVersion="{min_sdk}" android:targetSdkVersion="{target_sdk}" />

"#,
        build = settings.build_number,
        version = settings.version_name,
        package = package,
        min_sdk = settings.manifest_min_sdk(),
        target_sdk = settings.target_sdk(),
    );

    let mut permission = |name: &str| {
        xml.push_str(&format!(
            "    <uses-permission android:name=\"{}\" />\n",
            name
        ))
    };
    if has(Permissions::WRITE) {
        permission("android.permission.WRITE_EXTERNAL_STORAGE");
    }
    if has(Permissions::INTERNET) {
        permission("android.permission.INTERNET");
        permission("android.permission.ACCESS_NETWORK_STATE");
        permission("android.permission.ACCESS_WIFI_STATE");
    }
    if has(Permissions::WAKE) {
        permission("android.permission.WAKE_LOCK");
    }
    if has(Permissions::LOCATION) && google {
        permission("android.permission.ACCESS_COARSE_LOCATION");
    }
    if has(Permissions::GPS) && google {
        permission("android.permission.ACCESS_FINE_LOCATION");
    }
    if has(Permissions::IAP) && google {
        permission("android.permission.BILLING");
    }
    if has(Permissions::CAMERA) {
        permission("android.permission.CAMERA");
    }
    if (settings.play_app_id.is_some() || has(Permissions::PUSH)) && google {
        permission("com.google.android.c2dm.permission.RECEIVE");
    }
    if has(Permissions::EXPANSION) && google {
        permission("android.permission.CHECK_LICENSE");
    }
    if has(Permissions::VIBRATE) {
        permission("android.permission.VIBRATE");
    }
    if has(Permissions::RECORD_AUDIO) {
        permission("android.permission.RECORD_AUDIO");
    }
    if settings.include_push_notify() {
        xml.push_str(&format!(
            "    <permission android:name=\"{0}.permission.C2D_MESSAGE\" android:protectionLevel=\"signature\" />\n\
             \x20   <uses-permission android:name=\"{0}.permission.C2D_MESSAGE\" />\n",
            package
        ));
    }
    if settings.arcore == ArCore::Required {
        xml.push_str(
            "    <uses-feature android:name=\"android.hardware.camera.ar\" android:required=\"true\" />\n",
        );
    }

    let application = template
        .replace(
            r#"screenOrientation="fullSensor""#,
            &format!(
                r#"screenOrientation="{}""#,
                settings.orientation.android_name()
            ),
        )
        .replace(ADDITIONAL_FILTERS, &intent_filters(settings))
        .replace("YOUR_PACKAGE_NAME_HERE", package)
        .replace("${applicationId}", package);
    xml.push_str(&application);

    if has(Permissions::EXPANSION) && google {
        xml.push_str(
            r#"
        <service android:name="com.google.android.vending.expansion.downloader.impl.DownloaderService"
            android:enabled="true"/>
        <receiver android:name="com.google.android.vending.expansion.downloader.impl.DownloaderService$AlarmReceiver"
            android:enabled="true"/>"#,
        );
    }

    if google {
        xml.push_str(
            r#"
        <activity android:name="com.google.android.gms.auth.api.signin.internal.SignInHubActivity"
            android:excludeFromRecents="true"
            android:exported="false"
            android:theme="@android:style/Theme.Translucent.NoTitleBar" />
        <service android:name="com.google.android.gms.auth.api.signin.RevocationBoundService"
            android:exported="true"
            android:permission="com.google.android.gms.auth.api.signin.permission.REVOCATION_NOTIFICATION" />"#,
        );
    }

    if has(Permissions::IAP) && google {
        xml.push_str(
            r#"
        <activity android:name="com.google.android.gms.ads.purchase.InAppPurchaseActivity"
            android:theme="@style/Theme.IAPTheme" />"#,
        );
    }

    if settings.include_google_play() {
        xml.push_str(
            r#"
        <activity android:name="com.google.android.gms.common.api.GoogleApiActivity"
            android:exported="false"
            android:theme="@android:style/Theme.Translucent.NoTitleBar" />"#,
        );
    }

    if settings.include_google_play() || settings.include_firebase() || settings.include_push_notify() {
        xml.push_str(&format!(
            r#"
        <provider android:authorities="{}.firebaseinitprovider"
            android:name="com.google.firebase.provider.FirebaseInitProvider"
            android:exported="false"
            android:initOrder="100" />"#,
            package
        ));
    }

    if settings.include_firebase() {
        xml.push_str(
            r#"
        <receiver
            android:name="com.google.android.gms.measurement.AppMeasurementReceiver"
            android:enabled="true"
            android:exported="false" >
        </receiver>
        <service android:name="com.google.android.gms.measurement.AppMeasurementService"
            android:enabled="true"
            android:exported="false"/>
        <service
            android:name="com.google.android.gms.measurement.AppMeasurementJobService"
            android:enabled="true"
            android:exported="false"
            android:permission="android.permission.BIND_JOB_SERVICE" />
        <service
            android:name="com.google.firebase.components.ComponentDiscoveryService"
            android:exported="false" >
            <meta-data
                android:name="com.google.firebase.components:com.google.firebase.analytics.connector.internal.AnalyticsConnectorRegistrar"
                android:value="com.google.firebase.components.ComponentRegistrar" />
            <meta-data
                android:name="com.google.firebase.components:com.google.firebase.iid.Registrar"
                android:value="com.google.firebase.components.ComponentRegistrar" />
        </service>"#,
        );
    }

    if settings.include_firebase() || settings.include_push_notify() {
        xml.push_str(
            r#"
        <receiver android:name="com.google.firebase.iid.FirebaseInstanceIdReceiver"
            android:exported="true"
            android:permission="com.google.android.c2dm.permission.SEND" >
            <intent-filter>
                <action android:name="com.google.android.c2dm.intent.RECEIVE" />
            </intent-filter>
        </receiver>"#,
        );
    }

    if settings.include_push_notify() {
        xml.push_str(
            r#"
        <meta-data android:name="com.google.firebase.messaging.default_notification_icon"
            android:resource="@drawable/icon_white" />
        <service android:name="com.google.firebase.messaging.FirebaseMessagingService"
            android:exported="true" >
            <intent-filter android:priority="-500" >
                <action android:name="com.google.firebase.MESSAGING_EVENT" />
            </intent-filter>
        </service>"#,
        );
    }

    if settings.include_admob() {
        xml.push_str(&format!(
            r#"
        <provider
            android:name="com.google.android.gms.ads.MobileAdsInitProvider"
            android:authorities="{}.mobileadsinitprovider"
            android:exported="false"
            android:initOrder="100" />"#,
            package
        ));
    }

    if settings.arcore != ArCore::None {
        let mode = if settings.arcore == ArCore::Optional {
            "optional"
        } else {
            "required"
        };
        xml.push_str(&format!(
            r#"
        <meta-data android:name="com.google.ar.core" android:value="{}" />
        <meta-data android:name="com.google.ar.core.min_apk_version" android:value="190519000" />
        <activity
            android:name="com.google.ar.core.InstallActivity"
            android:configChanges="keyboardHidden|orientation|screenSize"
            android:excludeFromRecents="true"
            android:exported="false"
            android:launchMode="singleTop"
            android:theme="@android:style/Theme.Material.Light.Dialog.Alert" />"#,
            mode
        ));
    }

    xml.push_str(
        r#"
    </application>
</manifest>
"#,
    );
    xml
}

/// Intent filters for the URL scheme and deep link.
fn intent_filters(settings: &ApkSettings) -> String {
    let mut filters = String::new();

    if let Some(scheme) = &settings.url_scheme {
        filters.push_str(&format!(
            r#"
            <intent-filter>
                <action android:name="android.intent.action.VIEW" />
                <category android:name="android.intent.category.DEFAULT" />
                <category android:name="android.intent.category.BROWSABLE" />
                <data android:scheme="{}" />
            </intent-filter>"#,
            scheme
        ));
    }

    if let Some((scheme, rest)) = settings.deep_link.as_deref().and_then(|l| l.split_once("://")) {
        let (host, path) = match rest.find('/') {
            Some(i) if i + 1 < rest.len() => (&rest[..i], Some(&rest[i..])),
            Some(i) => (&rest[..i], None),
            None => (rest, None),
        };
        let mut data = format!(r#"<data android:scheme="{}""#, scheme);
        if !host.is_empty() {
            data.push_str(&format!(r#" android:host="{}""#, host));
            if let Some(path) = path {
                data.push_str(&format!(r#" android:pathPrefix="{}""#, path));
            }
        }
        filters.push_str(&format!(
            r#"
            <intent-filter>
                <action android:name="android.intent.action.VIEW" />
                <category android:name="android.intent.category.DEFAULT" />
                <category android:name="android.intent.category.BROWSABLE" />
                {} />
            </intent-filter>"#,
            data
        ));
    }

    filters
}
